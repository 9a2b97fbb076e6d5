//! 敌方自动出牌策略：在可支付的手牌中均匀随机选择。

pub mod policy;

pub use policy::{choose_affordable, decide, EnemyDecision};
