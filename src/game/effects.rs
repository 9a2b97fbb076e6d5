//! 卡牌效果结算：把卡牌数值字段编译成效果列表，再按顺序作用到双方。

use serde::{Deserialize, Serialize};

use super::catalog::CardDefinition;
use super::element::{self, Element, Multiplier};
use super::state::{BattleEvent, CardPlaySummary, Combatant, Side, StatusKind};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EffectTarget {
    User,
    Opponent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum EffectKind {
    Damage { amount: i32 },
    /// 出牌方持有格挡时追加的伤害。
    BonusDamageWhileBlocking { amount: i32 },
    /// 目标当前元素为 `trigger` 时，按基础伤害的万分比追加（不吃倍率）。
    ElementBonus { trigger: Element, basis_points: u32 },
    Heal { amount: i32 },
    Block { amount: i32 },
    /// 目标处于潮湿时额外获得的格挡。
    ConditionalBlock { amount: i32 },
    Burn { damage_per_turn: i32, turns: i32 },
    Wet { turns: i32 },
    Weak { turns: i32 },
    Vulnerable { turns: i32 },
    Shield { reduce_per_hit: i32, hits: i32 },
}

impl EffectKind {
    pub fn target(&self) -> EffectTarget {
        match self {
            EffectKind::Damage { .. }
            | EffectKind::BonusDamageWhileBlocking { .. }
            | EffectKind::ElementBonus { .. }
            | EffectKind::Burn { .. }
            | EffectKind::Wet { .. }
            | EffectKind::Weak { .. }
            | EffectKind::Vulnerable { .. } => EffectTarget::Opponent,
            EffectKind::Heal { .. }
            | EffectKind::Block { .. }
            | EffectKind::ConditionalBlock { .. }
            | EffectKind::Shield { .. } => EffectTarget::User,
        }
    }

    fn status(&self) -> Option<(StatusKind, i32, i32)> {
        match *self {
            EffectKind::Burn {
                damage_per_turn,
                turns,
            } => Some((StatusKind::Burn, damage_per_turn, turns)),
            EffectKind::Wet { turns } => Some((StatusKind::Wet, 0, turns)),
            EffectKind::Weak { turns } => Some((StatusKind::Weak, 0, turns)),
            EffectKind::Vulnerable { turns } => Some((StatusKind::Vulnerable, 0, turns)),
            EffectKind::Shield {
                reduce_per_hit,
                hits,
            } => Some((StatusKind::Shield, reduce_per_hit, hits)),
            _ => None,
        }
    }
}

type Extractor = fn(&CardDefinition) -> Option<EffectKind>;

/// 结算顺序表：伤害类在前，自身增益其次，状态最后。
const EFFECT_TABLE: &[Extractor] = &[
    damage,
    bonus_damage,
    element_bonus,
    heal,
    block,
    conditional_block,
    burn,
    wet,
    weak,
    vulnerable,
    shield,
];

fn damage(card: &CardDefinition) -> Option<EffectKind> {
    (card.base_damage > 0).then_some(EffectKind::Damage {
        amount: card.base_damage,
    })
}

fn bonus_damage(card: &CardDefinition) -> Option<EffectKind> {
    (card.bonus_damage > 0).then_some(EffectKind::BonusDamageWhileBlocking {
        amount: card.bonus_damage,
    })
}

fn element_bonus(card: &CardDefinition) -> Option<EffectKind> {
    let basis_points = card.element_bonus_basis_points();
    (basis_points > 0).then(|| EffectKind::ElementBonus {
        trigger: card.bonus_trigger(),
        basis_points,
    })
}

fn heal(card: &CardDefinition) -> Option<EffectKind> {
    (card.heal > 0).then_some(EffectKind::Heal { amount: card.heal })
}

fn block(card: &CardDefinition) -> Option<EffectKind> {
    (card.base_block > 0).then_some(EffectKind::Block {
        amount: card.base_block,
    })
}

fn conditional_block(card: &CardDefinition) -> Option<EffectKind> {
    (card.conditional_block > 0).then_some(EffectKind::ConditionalBlock {
        amount: card.conditional_block,
    })
}

fn burn(card: &CardDefinition) -> Option<EffectKind> {
    card.has_burn().then_some(EffectKind::Burn {
        damage_per_turn: card.burn_tick,
        turns: card.burn_turns,
    })
}

fn wet(card: &CardDefinition) -> Option<EffectKind> {
    (card.wet_turns > 0).then_some(EffectKind::Wet {
        turns: card.wet_turns,
    })
}

fn weak(card: &CardDefinition) -> Option<EffectKind> {
    (card.weak_turns > 0).then_some(EffectKind::Weak {
        turns: card.weak_turns,
    })
}

fn vulnerable(card: &CardDefinition) -> Option<EffectKind> {
    (card.vulnerable_turns > 0).then_some(EffectKind::Vulnerable {
        turns: card.vulnerable_turns,
    })
}

fn shield(card: &CardDefinition) -> Option<EffectKind> {
    card.has_shield().then_some(EffectKind::Shield {
        reduce_per_hit: card.reduce_per_hit,
        hits: card.hit_count,
    })
}

pub fn compile_effects(card: &CardDefinition) -> Vec<EffectKind> {
    EFFECT_TABLE.iter().filter_map(|extract| extract(card)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectContext {
    pub user_side: Side,
}

impl EffectContext {
    pub fn new(user_side: Side) -> Self {
        Self { user_side }
    }

    fn side_of(&self, target: EffectTarget) -> Side {
        match target {
            EffectTarget::User => self.user_side,
            EffectTarget::Opponent => self.user_side.opponent(),
        }
    }
}

#[derive(Default, Debug, Clone)]
pub struct EffectResolution {
    pub events: Vec<BattleEvent>,
    pub summary: CardPlaySummary,
}

/// 单张卡牌的结算过程中的累计量。
struct Pass {
    multiplier: Multiplier,
    base_hit: Option<i32>,
}

pub struct CardResolver;

impl CardResolver {
    pub fn multiplier_for(card: &CardDefinition, user: &Combatant, target: &Combatant) -> Multiplier {
        let m = element::multiplier(
            user.innate_polarity(),
            user.innate_element(),
            card.element,
            card.polarity,
            target.current_element(),
        );
        if user.weak_turns() > 0 {
            m.weakened()
        } else {
            m
        }
    }

    pub fn resolve(
        card: &CardDefinition,
        ctx: EffectContext,
        user: &mut Combatant,
        target: &mut Combatant,
    ) -> EffectResolution {
        let mut pass = Pass {
            multiplier: Self::multiplier_for(card, user, target),
            base_hit: None,
        };
        let mut resolution = EffectResolution {
            events: Vec::new(),
            summary: CardPlaySummary {
                multiplier: pass.multiplier.value(),
                ..CardPlaySummary::default()
            },
        };

        for effect in compile_effects(card) {
            Self::apply(&effect, ctx, &mut pass, user, target, &mut resolution);
        }
        resolution
    }

    fn apply(
        effect: &EffectKind,
        ctx: EffectContext,
        pass: &mut Pass,
        user: &mut Combatant,
        target: &mut Combatant,
        resolution: &mut EffectResolution,
    ) {
        let side = ctx.side_of(effect.target());
        match *effect {
            EffectKind::Damage { amount } => {
                let hit = pass.multiplier.apply(amount);
                pass.base_hit = Some(hit);
                Self::hit(target, side, hit, resolution);
            }
            EffectKind::BonusDamageWhileBlocking { amount } => {
                if user.block() > 0 {
                    let hit = pass.multiplier.apply(amount);
                    Self::hit(target, side, hit, resolution);
                }
            }
            EffectKind::ElementBonus {
                trigger,
                basis_points,
            } => {
                if let Some(prior) = pass.base_hit {
                    if target.current_element() == trigger {
                        let extra = Multiplier::from_basis_points(basis_points).apply(prior);
                        Self::hit(target, side, extra, resolution);
                    }
                }
            }
            EffectKind::Heal { amount } => {
                let healed = user.heal(amount);
                resolution.summary.healed += healed;
                if healed > 0 {
                    resolution.events.push(BattleEvent::CombatantHpChanged {
                        side,
                        hp: user.current_hp(),
                        max_hp: user.max_hp(),
                        delta: healed,
                    });
                }
            }
            EffectKind::Block { amount } => {
                resolution.summary.block_gained += user.gain_block(amount);
            }
            EffectKind::ConditionalBlock { amount } => {
                if target.wet_turns() > 0 {
                    resolution.summary.block_gained += user.gain_block(amount);
                }
            }
            EffectKind::Burn {
                damage_per_turn,
                turns,
            } => target.apply_burn(damage_per_turn, turns),
            EffectKind::Wet { turns } => target.apply_wet(turns),
            EffectKind::Weak { turns } => target.apply_weak(turns),
            EffectKind::Vulnerable { turns } => target.apply_vulnerable(turns),
            EffectKind::Shield {
                reduce_per_hit,
                hits,
            } => user.apply_shield(reduce_per_hit, hits),
        }

        if let Some((status, magnitude, turns)) = effect.status() {
            resolution.summary.statuses.push(status);
            resolution.events.push(BattleEvent::StatusApplied {
                side,
                status,
                magnitude,
                turns,
            });
        }
    }

    fn hit(target: &mut Combatant, side: Side, amount: i32, resolution: &mut EffectResolution) {
        let report = target.take_damage(amount);
        resolution.summary.damage_dealt += report.hp_lost;
        if report.hp_lost > 0 {
            resolution.events.push(BattleEvent::CombatantHpChanged {
                side,
                hp: target.current_hp(),
                max_hp: target.max_hp(),
                delta: -report.hp_lost,
            });
        }
    }
}
