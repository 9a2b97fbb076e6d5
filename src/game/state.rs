//! 战斗状态：战斗者、手牌、阶段、事件与快照。

use serde::{Deserialize, Serialize};

use super::catalog::CardId;
use super::element::{Element, Polarity};

/// 一场战斗内唯一的手牌实例标识。
pub type InstanceId = u32;

const DEFAULT_MAX_HP: i32 = 100;

/// 对战双方。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StatusKind {
    Wet,
    Weak,
    Vulnerable,
    Burn,
    Shield,
}

/// 创建战斗者所需的模板数据。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CombatantTemplate {
    pub name: String,
    pub element: Element,
    pub polarity: Polarity,
    #[serde(default = "default_max_hp")]
    pub max_hp: i32,
}

fn default_max_hp() -> i32 {
    DEFAULT_MAX_HP
}

impl CombatantTemplate {
    pub fn new(name: impl Into<String>, element: Element, polarity: Polarity, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            element,
            polarity,
            max_hp,
        }
    }
}

/// Breakdown of a single `take_damage` call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DamageReport {
    pub incoming: i32,
    pub after_shield: i32,
    pub after_vulnerable: i32,
    pub block_lost: i32,
    pub hp_lost: i32,
}

/// 战斗中一方的可变状态；只能通过自身的方法修改。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Combatant {
    name: String,
    innate_element: Element,
    innate_polarity: Polarity,
    current_element: Element,
    max_hp: i32,
    current_hp: i32,
    block: i32,
    wet_turns: i32,
    weak_turns: i32,
    vulnerable_turns: i32,
    burn_turns: i32,
    burn_damage_per_turn: i32,
    shield_hits_left: i32,
    shield_reduce_per_hit: i32,
}

impl Combatant {
    pub fn from_template(template: &CombatantTemplate) -> Self {
        let max_hp = template.max_hp.max(0);
        Self {
            name: template.name.clone(),
            innate_element: template.element,
            innate_polarity: template.polarity,
            current_element: template.element,
            max_hp,
            current_hp: max_hp,
            block: 0,
            wet_turns: 0,
            weak_turns: 0,
            vulnerable_turns: 0,
            burn_turns: 0,
            burn_damage_per_turn: 0,
            shield_hits_left: 0,
            shield_reduce_per_hit: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn innate_element(&self) -> Element {
        self.innate_element
    }

    pub fn innate_polarity(&self) -> Polarity {
        self.innate_polarity
    }

    pub fn current_element(&self) -> Element {
        self.current_element
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn current_hp(&self) -> i32 {
        self.current_hp
    }

    pub fn block(&self) -> i32 {
        self.block
    }

    pub fn wet_turns(&self) -> i32 {
        self.wet_turns
    }

    pub fn weak_turns(&self) -> i32 {
        self.weak_turns
    }

    pub fn vulnerable_turns(&self) -> i32 {
        self.vulnerable_turns
    }

    pub fn burn(&self) -> (i32, i32) {
        (self.burn_damage_per_turn, self.burn_turns)
    }

    pub fn shield(&self) -> (i32, i32) {
        (self.shield_reduce_per_hit, self.shield_hits_left)
    }

    pub fn is_dead(&self) -> bool {
        self.current_hp == 0
    }

    pub fn reset_element(&mut self) {
        self.current_element = self.innate_element;
    }

    /// 结算顺序：护盾减伤 → 易伤放大 → 格挡吸收 → 扣血。
    pub fn take_damage(&mut self, amount: i32) -> DamageReport {
        let incoming = amount.max(0);
        let mut dmg = incoming;

        if self.shield_hits_left > 0 {
            dmg = (dmg - self.shield_reduce_per_hit).max(0);
            self.shield_hits_left -= 1;
        }
        let after_shield = dmg;

        if self.vulnerable_turns > 0 {
            // ceil(dmg * 1.25), widened so huge hits clamp instead of wrapping
            let scaled = (dmg as u64 * 5).div_ceil(4);
            dmg = i32::try_from(scaled).unwrap_or(i32::MAX);
        }
        let after_vulnerable = dmg;

        let hp_damage = (dmg - self.block).max(0);
        let block_before = self.block;
        self.block = (self.block - dmg).max(0);
        let hp_before = self.current_hp;
        self.current_hp = (self.current_hp - hp_damage).max(0);

        let report = DamageReport {
            incoming,
            after_shield,
            after_vulnerable,
            block_lost: block_before - self.block,
            hp_lost: hp_before - self.current_hp,
        };
        log::debug!(
            "{} took {} (raw {}), hp={}, block={}",
            self.name,
            report.hp_lost,
            incoming,
            self.current_hp,
            self.block
        );
        report
    }

    pub fn gain_block(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.block;
        self.block = self.block.saturating_add(amount);
        self.block - before
    }

    /// 返回实际回复量。
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.current_hp;
        self.current_hp = self.max_hp.min(self.current_hp.saturating_add(amount));
        self.current_hp - before
    }

    pub fn apply_wet(&mut self, turns: i32) {
        self.wet_turns = self.wet_turns.max(turns);
    }

    pub fn apply_weak(&mut self, turns: i32) {
        self.weak_turns = self.weak_turns.max(turns);
    }

    pub fn apply_vulnerable(&mut self, turns: i32) {
        self.vulnerable_turns = self.vulnerable_turns.max(turns);
    }

    pub fn apply_burn(&mut self, damage_per_turn: i32, turns: i32) {
        self.burn_damage_per_turn = damage_per_turn;
        self.burn_turns = turns;
    }

    pub fn apply_shield(&mut self, reduce_per_hit: i32, hits: i32) {
        self.shield_reduce_per_hit = reduce_per_hit;
        self.shield_hits_left = hits;
    }

    /// 阶段结束结算：燃烧直接扣血（无视格挡与护盾）、状态递减、护盾清空。
    /// 返回燃烧造成的实际伤害。
    pub fn tick_end(&mut self) -> i32 {
        let mut burned = 0;
        if self.burn_turns > 0 && self.burn_damage_per_turn > 0 {
            let before = self.current_hp;
            self.current_hp = (self.current_hp - self.burn_damage_per_turn).max(0);
            burned = before - self.current_hp;
            self.burn_turns -= 1;
            if self.burn_turns == 0 {
                self.burn_damage_per_turn = 0;
            }
            log::debug!("{} burned for {}, hp={}", self.name, burned, self.current_hp);
        }

        if self.weak_turns > 0 {
            self.weak_turns -= 1;
        }
        if self.wet_turns > 0 {
            self.wet_turns -= 1;
        }
        if self.vulnerable_turns > 0 {
            self.vulnerable_turns -= 1;
        }

        if self.shield_hits_left > 0 || self.shield_reduce_per_hit > 0 {
            log::debug!(
                "{} shield expired (hits left {})",
                self.name,
                self.shield_hits_left
            );
        }
        self.shield_hits_left = 0;
        self.shield_reduce_per_hit = 0;

        burned
    }
}

/// 手牌中的一张牌，引用卡牌库中的定义。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardInstance {
    pub id: InstanceId,
    pub card_id: CardId,
    pub cost: u8,
}

/// 双方手牌，按抽牌顺序排列。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hands {
    #[serde(default)]
    pub player: Vec<CardInstance>,
    #[serde(default)]
    pub enemy: Vec<CardInstance>,
}

impl Hands {
    pub fn of(&self, side: Side) -> &[CardInstance] {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    fn of_mut(&mut self, side: Side) -> &mut Vec<CardInstance> {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    pub fn push(&mut self, side: Side, card: CardInstance) {
        self.of_mut(side).push(card);
    }

    pub fn find(&self, side: Side, instance_id: InstanceId) -> Option<&CardInstance> {
        self.of(side).iter().find(|card| card.id == instance_id)
    }

    pub fn remove(&mut self, side: Side, instance_id: InstanceId) -> Option<CardInstance> {
        let hand = self.of_mut(side);
        let idx = hand.iter().position(|card| card.id == instance_id)?;
        Some(hand.remove(idx))
    }

    pub fn ids(&self, side: Side) -> Vec<InstanceId> {
        self.of(side).iter().map(|card| card.id).collect()
    }
}

/// 战斗阶段状态机。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BattlePhase {
    PlayerDraw,
    PlayerAction,
    EnemyDraw,
    EnemyAction,
    RoundEnd,
    PlayerVictory,
    EnemyVictory,
}

impl BattlePhase {
    pub fn owner(self) -> Side {
        match self {
            BattlePhase::EnemyDraw | BattlePhase::EnemyAction => Side::Enemy,
            _ => Side::Player,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BattlePhase::PlayerVictory | BattlePhase::EnemyVictory)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BattleOutcome {
    InProgress,
    PlayerVictory,
    EnemyVictory,
}

impl BattleOutcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            BattleOutcome::InProgress => None,
            BattleOutcome::PlayerVictory => Some(Side::Player),
            BattleOutcome::EnemyVictory => Some(Side::Enemy),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CardPlaySummary {
    pub multiplier: f64,
    pub damage_dealt: i32,
    pub block_gained: i32,
    pub healed: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<StatusKind>,
}

/// 战斗事件流，供表现层消费。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum BattleEvent {
    RoundStarted {
        round: u32,
    },
    TurnChanged {
        owner: Side,
    },
    CardDrawn {
        side: Side,
        instance_id: InstanceId,
        card_id: CardId,
    },
    CardPlayed {
        side: Side,
        instance_id: InstanceId,
        card_id: CardId,
        summary: CardPlaySummary,
    },
    StatusApplied {
        side: Side,
        status: StatusKind,
        magnitude: i32,
        turns: i32,
    },
    CombatantHpChanged {
        side: Side,
        hp: i32,
        max_hp: i32,
        delta: i32,
    },
    BattleEnded {
        winner: Side,
    },
}

/// 每一方的能量状态。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnergyPool {
    pub current: u8,
    pub max: u8,
    pub reserve: bool,
}

/// 整场战斗的状态，由回合引擎独占。
#[derive(Debug, Clone, Serialize)]
pub struct BattleState {
    pub round: u32,
    pub phase: BattlePhase,
    pub player: Combatant,
    pub enemy: Combatant,
    pub player_energy: EnergyPool,
    pub enemy_energy: EnergyPool,
    pub hands: Hands,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<BattleEvent>,
    next_instance_id: InstanceId,
}

impl BattleState {
    pub fn new(player: Combatant, enemy: Combatant) -> Self {
        Self {
            round: 1,
            phase: BattlePhase::PlayerDraw,
            player,
            enemy,
            player_energy: EnergyPool::default(),
            enemy_energy: EnergyPool::default(),
            hands: Hands::default(),
            event_log: Vec::new(),
            next_instance_id: 1,
        }
    }

    pub fn record_event(&mut self, event: BattleEvent) {
        self.event_log.push(event);
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    pub fn combatant_mut(&mut self, side: Side) -> &mut Combatant {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    /// 同时借出行动方与对手。
    pub fn combatants_mut(&mut self, user: Side) -> (&mut Combatant, &mut Combatant) {
        match user {
            Side::Player => (&mut self.player, &mut self.enemy),
            Side::Enemy => (&mut self.enemy, &mut self.player),
        }
    }

    pub fn energy(&self, side: Side) -> &EnergyPool {
        match side {
            Side::Player => &self.player_energy,
            Side::Enemy => &self.enemy_energy,
        }
    }

    pub fn energy_mut(&mut self, side: Side) -> &mut EnergyPool {
        match side {
            Side::Player => &mut self.player_energy,
            Side::Enemy => &mut self.enemy_energy,
        }
    }

    pub fn allocate_instance_id(&mut self) -> InstanceId {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        id
    }

    pub fn outcome(&self) -> BattleOutcome {
        match self.phase {
            BattlePhase::PlayerVictory => BattleOutcome::PlayerVictory,
            BattlePhase::EnemyVictory => BattleOutcome::EnemyVictory,
            _ => BattleOutcome::InProgress,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// 检查是否有一方阵亡；双方同时阵亡时判敌方胜。
    pub fn evaluate_victory(&mut self) -> Option<BattleEvent> {
        if self.is_finished() {
            return None;
        }
        let winner = if self.player.is_dead() {
            Side::Enemy
        } else if self.enemy.is_dead() {
            Side::Player
        } else {
            return None;
        };

        self.phase = match winner {
            Side::Player => BattlePhase::PlayerVictory,
            Side::Enemy => BattlePhase::EnemyVictory,
        };
        log::info!("battle ended, winner: {winner:?}");
        let event = BattleEvent::BattleEnded { winner };
        self.record_event(event.clone());
        Some(event)
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            round: self.round,
            phase: self.phase,
            turn_owner: self.phase.owner(),
            player_hp: self.player.current_hp(),
            player_max_hp: self.player.max_hp(),
            player_block: self.player.block(),
            player_energy: self.player_energy.current,
            player_max_energy: self.player_energy.max,
            enemy_hp: self.enemy.current_hp(),
            enemy_max_hp: self.enemy.max_hp(),
            enemy_block: self.enemy.block(),
            enemy_energy: self.enemy_energy.current,
            enemy_max_energy: self.enemy_energy.max,
            player_hand_ids: self.hands.ids(Side::Player),
            enemy_hand_ids: self.hands.ids(Side::Enemy),
            terminal: self.outcome(),
        }
    }
}

/// 提供给表现层的只读快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleSnapshot {
    pub round: u32,
    pub phase: BattlePhase,
    pub turn_owner: Side,
    pub player_hp: i32,
    pub player_max_hp: i32,
    pub player_block: i32,
    pub player_energy: u8,
    pub player_max_energy: u8,
    pub enemy_hp: i32,
    pub enemy_max_hp: i32,
    pub enemy_block: i32,
    pub enemy_energy: u8,
    pub enemy_max_energy: u8,
    pub player_hand_ids: Vec<InstanceId>,
    pub enemy_hand_ids: Vec<InstanceId>,
    pub terminal: BattleOutcome,
}
