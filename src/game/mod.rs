//! 战斗核心逻辑模块（五行克制、卡牌库、状态机、规则引擎等）。

pub mod catalog;
pub mod effects;
pub mod element;
pub mod rules;
pub mod state;

pub use catalog::{CardCatalog, CardDefinition, CardId, CardType, CatalogError};
pub use effects::{
    compile_effects,
    CardResolver,
    EffectContext,
    EffectKind,
    EffectResolution,
    EffectTarget,
};
pub use element::{multiplier, overcomes, Element, Multiplier, Polarity};
pub use state::{
    BattleEvent,
    BattleOutcome,
    BattlePhase,
    BattleSnapshot,
    BattleState,
    CardInstance,
    CardPlaySummary,
    Combatant,
    CombatantTemplate,
    DamageReport,
    EnergyPool,
    Hands,
    InstanceId,
    Side,
    StatusKind,
};
pub use rules::{BattleConfig, RuleError, RuleResolution, TurnEngine};
