use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::{CardId, CardInstance, InstanceId};

/// 敌方自动出牌的决策结果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnemyDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<InstanceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    pub energy: u8,
    pub affordable: Vec<InstanceId>,
}

impl EnemyDecision {
    pub fn phase_complete(&self) -> bool {
        self.instance_id.is_none()
    }
}

pub fn affordable(hand: &[CardInstance], energy: u8) -> Vec<&CardInstance> {
    hand.iter().filter(|card| card.cost <= energy).collect()
}

/// 在可支付的手牌中等概率随机选一张；没有可支付的牌时返回 `None`。
pub fn choose_affordable<'a, R: Rng>(
    hand: &'a [CardInstance],
    energy: u8,
    rng: &mut R,
) -> Option<&'a CardInstance> {
    affordable(hand, energy).choose(rng).copied()
}

pub fn decide<R: Rng>(hand: &[CardInstance], energy: u8, rng: &mut R) -> EnemyDecision {
    let affordable_ids = affordable(hand, energy)
        .iter()
        .map(|card| card.id)
        .collect();
    let chosen = choose_affordable(hand, energy, rng);
    EnemyDecision {
        instance_id: chosen.map(|card| card.id),
        card_id: chosen.map(|card| card.card_id.clone()),
        energy,
        affordable: affordable_ids,
    }
}
