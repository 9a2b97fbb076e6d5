//! 回合引擎：阶段状态机、能量规则与敌方自动行动。

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{self, EnemyDecision};

use super::{
    catalog::{CardCatalog, CardId, CatalogError},
    effects::{CardResolver, EffectContext},
    state::{
        BattleEvent, BattleOutcome, BattlePhase, BattleSnapshot, BattleState, CardInstance,
        Combatant, CombatantTemplate, InstanceId, Side,
    },
};

const DEFAULT_STARTING_ENERGY: u8 = 3;
const DEFAULT_MAX_ENERGY: u8 = 6;
const DEFAULT_ENERGY_GROWTH: u8 = 1;
const DEFAULT_DRAW_PER_TURN: u8 = 3;

/// 战斗规则参数。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BattleConfig {
    pub starting_energy: u8,
    pub max_energy: u8,
    pub energy_growth: u8,
    pub draw_per_turn: u8,
    /// 后手方在第一回合获得 1 点预留能量。
    pub enemy_starts_with_reserve: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            starting_energy: DEFAULT_STARTING_ENERGY,
            max_energy: DEFAULT_MAX_ENERGY,
            energy_growth: DEFAULT_ENERGY_GROWTH,
            draw_per_turn: DEFAULT_DRAW_PER_TURN,
            enemy_starts_with_reserve: false,
        }
    }
}

impl BattleConfig {
    pub fn with_draw_per_turn(mut self, draw: u8) -> Self {
        self.draw_per_turn = draw;
        self
    }

    pub fn with_energy(mut self, starting: u8, max: u8, growth: u8) -> Self {
        self.starting_energy = starting;
        self.max_energy = max.max(starting);
        self.energy_growth = growth;
        self
    }

    pub fn with_enemy_reserve(mut self, enabled: bool) -> Self {
        self.enemy_starts_with_reserve = enabled;
        self
    }

    /// 第一回合为起始能量，之后每回合增长，封顶。
    pub fn energy_cap(&self, round: u32, previous_cap: u8) -> u8 {
        if round == 1 {
            self.starting_energy
        } else {
            previous_cap
                .saturating_add(self.energy_growth)
                .min(self.max_energy)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("action not allowed in {actual:?}, expected {expected:?}")]
    InvalidPhaseAction {
        expected: BattlePhase,
        actual: BattlePhase,
    },
    #[error("card costs {required} energy but only {available} is available")]
    InsufficientEnergy { required: u8, available: u8 },
    #[error("card instance {instance_id} is not in hand")]
    UnknownCardInstance { instance_id: InstanceId },
    #[error("battle already finished")]
    BattleFinished,
    #[error("card {card_id} is not in the catalog")]
    UnknownCard { card_id: CardId },
    #[error("combatant template {name} is invalid: {reason}")]
    InvalidTemplate { name: String, reason: String },
    #[error("catalog error: {error}")]
    Catalog { error: CatalogError },
}

impl From<CatalogError> for RuleError {
    fn from(error: CatalogError) -> Self {
        RuleError::Catalog { error }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleResolution {
    pub snapshot: BattleSnapshot,
    pub events: Vec<BattleEvent>,
    pub outcome: BattleOutcome,
}

impl RuleResolution {
    pub fn new(state: &BattleState, events: Vec<BattleEvent>) -> Self {
        Self {
            snapshot: state.snapshot(),
            events,
            outcome: state.outcome(),
        }
    }
}

/// 回合引擎：独占战斗状态、卡牌库与随机源，驱动阶段状态机。
#[derive(Debug, Clone)]
pub struct TurnEngine {
    state: BattleState,
    catalog: CardCatalog,
    config: BattleConfig,
    rng: SmallRng,
}

impl TurnEngine {
    pub fn start_battle(
        player: &CombatantTemplate,
        enemy: &CombatantTemplate,
        catalog: CardCatalog,
        seed: u64,
    ) -> Result<(Self, Vec<BattleEvent>), RuleError> {
        Self::start_with_config(
            player,
            enemy,
            catalog,
            BattleConfig::default(),
            SmallRng::seed_from_u64(seed),
        )
    }

    pub fn start_with_config(
        player: &CombatantTemplate,
        enemy: &CombatantTemplate,
        catalog: CardCatalog,
        config: BattleConfig,
        rng: SmallRng,
    ) -> Result<(Self, Vec<BattleEvent>), RuleError> {
        Self::ensure_template(player)?;
        Self::ensure_template(enemy)?;
        catalog.ensure_complete()?;

        let mut player = Combatant::from_template(player);
        let mut enemy = Combatant::from_template(enemy);
        player.reset_element();
        enemy.reset_element();

        let mut state = BattleState::new(player, enemy);
        state.enemy_energy.reserve = config.enemy_starts_with_reserve;

        let mut engine = Self {
            state,
            catalog,
            config,
            rng,
        };
        log::info!(
            "battle started: {} vs {}",
            engine.state.player.name(),
            engine.state.enemy.name()
        );

        let mut events = Vec::new();
        engine.emit(&mut events, BattleEvent::RoundStarted { round: 1 });
        engine.run_draw(Side::Player, &mut events)?;
        Ok((engine, events))
    }

    fn ensure_template(template: &CombatantTemplate) -> Result<(), RuleError> {
        if template.max_hp <= 0 {
            return Err(RuleError::InvalidTemplate {
                name: template.name.clone(),
                reason: format!("max_hp must be positive, got {}", template.max_hp),
            });
        }
        Ok(())
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        self.state.snapshot()
    }

    fn emit(&mut self, events: &mut Vec<BattleEvent>, event: BattleEvent) {
        self.state.record_event(event.clone());
        events.push(event);
    }

    fn ensure_phase(&self, expected: BattlePhase) -> Result<(), RuleError> {
        if self.state.is_finished() {
            return Err(RuleError::BattleFinished);
        }
        if self.state.phase != expected {
            return Err(RuleError::InvalidPhaseAction {
                expected,
                actual: self.state.phase,
            });
        }
        Ok(())
    }

    /// 抽牌阶段：计算能量上限、结算预留能量、抽牌，随后进入行动阶段。
    fn run_draw(&mut self, side: Side, events: &mut Vec<BattleEvent>) -> Result<(), RuleError> {
        self.state.phase = match side {
            Side::Player => BattlePhase::PlayerDraw,
            Side::Enemy => BattlePhase::EnemyDraw,
        };
        self.emit(events, BattleEvent::TurnChanged { owner: side });

        let round = self.state.round;
        let pool = self.state.energy_mut(side);
        pool.max = self.config.energy_cap(round, pool.max);
        pool.current = pool.max.saturating_add(u8::from(pool.reserve));
        pool.reserve = false;
        log::info!(
            "round {round} {side:?} phase, energy {}/{}",
            pool.current,
            pool.max
        );

        for _ in 0..self.config.draw_per_turn {
            let definition = self.catalog.draw(&mut self.rng).ok_or_else(|| {
                RuleError::Catalog {
                    error: CatalogError::IncompleteCatalog {
                        missing: self.catalog.missing_pairs(),
                    },
                }
            })?;
            let card_id = definition.id.clone();
            let cost = definition.cost;
            let instance_id = self.state.allocate_instance_id();
            self.state.hands.push(
                side,
                CardInstance {
                    id: instance_id,
                    card_id: card_id.clone(),
                    cost,
                },
            );
            log::debug!("{side:?} drew {card_id} (#{instance_id})");
            self.emit(
                events,
                BattleEvent::CardDrawn {
                    side,
                    instance_id,
                    card_id,
                },
            );
        }

        self.state.phase = match side {
            Side::Player => BattlePhase::PlayerAction,
            Side::Enemy => BattlePhase::EnemyAction,
        };
        Ok(())
    }

    /// 校验后再提交：任何拒绝都不会修改状态。
    fn play_card(
        &mut self,
        side: Side,
        instance_id: InstanceId,
        events: &mut Vec<BattleEvent>,
    ) -> Result<(), RuleError> {
        let instance = self
            .state
            .hands
            .find(side, instance_id)
            .ok_or(RuleError::UnknownCardInstance { instance_id })?;
        let definition = self
            .catalog
            .get(&instance.card_id)
            .ok_or_else(|| RuleError::UnknownCard {
                card_id: instance.card_id.clone(),
            })?;
        let available = self.state.energy(side).current;
        if definition.cost > available {
            return Err(RuleError::InsufficientEnergy {
                required: definition.cost,
                available,
            });
        }

        self.state.energy_mut(side).current -= definition.cost;
        let (user, target) = self.state.combatants_mut(side);
        let resolution = CardResolver::resolve(definition, EffectContext::new(side), user, target);
        self.state.hands.remove(side, instance_id);
        log::debug!(
            "{side:?} played {} (x{:.3}, {} dmg)",
            definition.id,
            resolution.summary.multiplier,
            resolution.summary.damage_dealt
        );

        let played = BattleEvent::CardPlayed {
            side,
            instance_id,
            card_id: definition.id.clone(),
            summary: resolution.summary,
        };
        self.emit(events, played);
        for event in resolution.events {
            self.emit(events, event);
        }
        if let Some(event) = self.state.evaluate_victory() {
            events.push(event);
        }
        Ok(())
    }

    pub fn submit_player_card(&mut self, instance_id: InstanceId) -> Result<Vec<BattleEvent>, RuleError> {
        if let Err(error) = self.ensure_phase(BattlePhase::PlayerAction) {
            log::warn!("rejected player card #{instance_id}: {error}");
            return Err(error);
        }
        let mut events = Vec::new();
        self.play_card(Side::Player, instance_id, &mut events)
            .inspect_err(|error| log::warn!("rejected player card #{instance_id}: {error}"))?;
        Ok(events)
    }

    pub fn end_player_phase(&mut self) -> Result<Vec<BattleEvent>, RuleError> {
        self.ensure_phase(BattlePhase::PlayerAction)
            .inspect_err(|error| log::warn!("rejected end of player phase: {error}"))?;
        let mut events = Vec::new();
        self.run_draw(Side::Enemy, &mut events)?;
        Ok(events)
    }

    /// 预测下一步敌方出牌，不修改状态。
    pub fn preview_enemy_choice(&self) -> Result<EnemyDecision, RuleError> {
        self.ensure_phase(BattlePhase::EnemyAction)?;
        let mut rng = self.rng.clone();
        Ok(ai::decide(
            self.state.hands.of(Side::Enemy),
            self.state.enemy_energy.current,
            &mut rng,
        ))
    }

    /// 敌方行动一步：打出一张随机可支付的牌；没有可支付的牌时结束本回合。
    pub fn tick_enemy_phase(&mut self) -> Result<Vec<BattleEvent>, RuleError> {
        self.ensure_phase(BattlePhase::EnemyAction)
            .inspect_err(|error| log::warn!("rejected enemy step: {error}"))?;
        let mut events = Vec::new();

        let decision = ai::decide(
            self.state.hands.of(Side::Enemy),
            self.state.enemy_energy.current,
            &mut self.rng,
        );
        match decision.instance_id {
            Some(instance_id) => self.play_card(Side::Enemy, instance_id, &mut events)?,
            None => self.run_round_end(&mut events)?,
        }
        Ok(events)
    }

    pub fn run_enemy_phase(&mut self) -> Result<Vec<BattleEvent>, RuleError> {
        self.ensure_phase(BattlePhase::EnemyAction)
            .inspect_err(|error| log::warn!("rejected enemy phase: {error}"))?;
        let mut events = Vec::new();
        while self.state.phase == BattlePhase::EnemyAction {
            events.extend(self.tick_enemy_phase()?);
        }
        Ok(events)
    }

    fn run_round_end(&mut self, events: &mut Vec<BattleEvent>) -> Result<(), RuleError> {
        self.state.phase = BattlePhase::RoundEnd;

        for side in [Side::Player, Side::Enemy] {
            let combatant = self.state.combatant_mut(side);
            let burned = combatant.tick_end();
            if burned > 0 {
                let event = BattleEvent::CombatantHpChanged {
                    side,
                    hp: combatant.current_hp(),
                    max_hp: combatant.max_hp(),
                    delta: -burned,
                };
                self.emit(events, event);
            }
        }
        if let Some(event) = self.state.evaluate_victory() {
            events.push(event);
            return Ok(());
        }

        self.state.round += 1;
        let round = self.state.round;
        self.emit(events, BattleEvent::RoundStarted { round });
        self.run_draw(Side::Player, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{CardDefinition, CardType};
    use crate::game::element::{Element, Polarity};
    use crate::game::state::StatusKind;

    fn player() -> CombatantTemplate {
        CombatantTemplate::new("Player", Element::Wood, Polarity::Yang, 100)
    }

    fn enemy() -> CombatantTemplate {
        CombatantTemplate::new("Enemy", Element::Earth, Polarity::Yin, 100)
    }

    fn start(seed: u64) -> TurnEngine {
        TurnEngine::start_battle(&player(), &enemy(), CardCatalog::standard(), seed)
            .expect("battle should start")
            .0
    }

    /// 每个 (元素, 阴阳) 都有一张卡，木阳为 20 点伤害的测试卡，其余为零费小技能。
    fn strike_catalog(strike_cost: u8) -> CardCatalog {
        let mut cards = Vec::new();
        for element in Element::ALL {
            for polarity in Polarity::ALL {
                let id = format!("{element}-{polarity}").to_lowercase();
                let card = if (element, polarity) == (Element::Wood, Polarity::Yang) {
                    CardDefinition::new(id, "Strike", element, polarity, strike_cost, CardType::Attack)
                        .with_damage(20)
                } else {
                    CardDefinition::new(id, "Guard", element, polarity, 3, CardType::Skill)
                        .with_block(1, 0)
                };
                cards.push(card);
            }
        }
        CardCatalog::new(cards).expect("test catalog should build")
    }

    fn seed_with_player_card(catalog: &CardCatalog, card_id: &str) -> (TurnEngine, InstanceId) {
        for seed in 0..10_000 {
            let (engine, _) = TurnEngine::start_battle(&player(), &enemy(), catalog.clone(), seed)
                .expect("battle should start");
            let found = engine
                .state()
                .hands
                .of(Side::Player)
                .iter()
                .find(|card| card.card_id == card_id)
                .map(|card| card.id);
            if let Some(instance_id) = found {
                return (engine, instance_id);
            }
        }
        panic!("no seed dealt {card_id}");
    }

    #[test]
    fn start_draws_player_hand_and_enters_action() {
        let engine = start(3);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.phase, BattlePhase::PlayerAction);
        assert_eq!(snapshot.turn_owner, Side::Player);
        assert_eq!(snapshot.player_hand_ids.len(), 3);
        assert!(snapshot.enemy_hand_ids.is_empty());
        assert_eq!(snapshot.player_energy, 3);
        assert_eq!(snapshot.player_max_energy, 3);
        assert_eq!(snapshot.terminal, BattleOutcome::InProgress);
    }

    #[test]
    fn end_to_end_first_strike() {
        let catalog = strike_catalog(1);
        let (mut engine, strike) = seed_with_player_card(&catalog, "wood-yang");

        let events = engine
            .submit_player_card(strike)
            .expect("strike should be playable");

        assert_eq!(engine.state().enemy.current_hp(), 70);
        assert_eq!(engine.state().enemy.block(), 0);
        assert_eq!(engine.snapshot().player_energy, 2);
        assert!(!engine.snapshot().player_hand_ids.contains(&strike));
        assert!(events.iter().any(|event| matches!(
            event,
            BattleEvent::CardPlayed { side: Side::Player, summary, .. } if summary.damage_dealt == 30
        )));
    }

    #[test]
    fn insufficient_energy_is_rejected_without_mutation() {
        let catalog = strike_catalog(5);
        let (mut engine, strike) = seed_with_player_card(&catalog, "wood-yang");
        let before = engine.snapshot();

        let error = engine.submit_player_card(strike).expect_err("cost 5 exceeds 3 energy");
        assert_eq!(
            error,
            RuleError::InsufficientEnergy {
                required: 5,
                available: 3
            }
        );
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn unknown_instance_is_rejected() {
        let mut engine = start(5);
        let before = engine.snapshot();
        let error = engine.submit_player_card(9_999).expect_err("not in hand");
        assert_eq!(error, RuleError::UnknownCardInstance { instance_id: 9_999 });
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn commands_outside_their_phase_are_rejected() {
        let mut engine = start(11);
        assert!(matches!(
            engine.tick_enemy_phase(),
            Err(RuleError::InvalidPhaseAction {
                expected: BattlePhase::EnemyAction,
                actual: BattlePhase::PlayerAction
            })
        ));

        engine.end_player_phase().expect("player may end their phase");
        assert_eq!(engine.phase(), BattlePhase::EnemyAction);
        let card = engine.state().hands.player[0].id;
        let before = engine.snapshot();
        assert!(matches!(
            engine.submit_player_card(card),
            Err(RuleError::InvalidPhaseAction { .. })
        ));
        assert!(engine.end_player_phase().is_err());
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn enemy_commands_rejected_during_player_phase() {
        let mut engine = start(13);
        let before = engine.snapshot();
        let log_len = engine.state().event_log.len();

        for result in [engine.run_enemy_phase(), engine.tick_enemy_phase()] {
            assert!(matches!(
                result,
                Err(RuleError::InvalidPhaseAction {
                    expected: BattlePhase::EnemyAction,
                    actual: BattlePhase::PlayerAction
                })
            ));
        }
        assert!(matches!(
            engine.preview_enemy_choice(),
            Err(RuleError::InvalidPhaseAction { .. })
        ));
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.state().event_log.len(), log_len);
    }

    #[test]
    fn enemy_phase_spends_energy_and_terminates() {
        let mut engine = start(21);
        engine.end_player_phase().expect("end player phase");
        assert_eq!(engine.snapshot().enemy_hand_ids.len(), 3);
        assert_eq!(engine.snapshot().enemy_energy, 3);

        let events = engine.run_enemy_phase().expect("enemy phase runs to completion");

        assert_eq!(engine.phase(), BattlePhase::PlayerAction);
        assert_eq!(engine.snapshot().round, 2);
        let enemy_cards = engine.state().hands.of(Side::Enemy);
        assert!(
            enemy_cards.iter().all(|card| card.cost > engine.state().enemy_energy.current),
            "phase only ends once nothing is affordable"
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, BattleEvent::RoundStarted { round: 2 })));
    }

    #[test]
    fn energy_cap_progression() {
        let mut engine = start(8);
        let mut caps = Vec::new();
        let mut enemy_caps = Vec::new();
        for _ in 0..6 {
            if engine.state().is_finished() {
                break;
            }
            caps.push(engine.snapshot().player_max_energy);
            engine.end_player_phase().expect("end player phase");
            enemy_caps.push(engine.snapshot().enemy_max_energy);
            engine.run_enemy_phase().expect("enemy phase");
        }
        let expected = [3, 4, 5, 6, 6, 6];
        assert_eq!(caps, expected[..caps.len()].to_vec());
        assert_eq!(enemy_caps, expected[..enemy_caps.len()].to_vec());
        assert!(caps.len() >= 4, "battle should last a few rounds");
    }

    #[test]
    fn config_energy_cap_sequence() {
        let config = BattleConfig::default();
        let mut cap = 0;
        let mut seen = Vec::new();
        for round in 1..=7 {
            cap = config.energy_cap(round, cap);
            seen.push(cap);
        }
        assert_eq!(seen, vec![3, 4, 5, 6, 6, 6, 6]);
    }

    #[test]
    fn enemy_reserve_grants_one_extra_energy_once() {
        let config = BattleConfig::default().with_enemy_reserve(true);
        let (mut engine, _) = TurnEngine::start_with_config(
            &player(),
            &enemy(),
            CardCatalog::standard(),
            config,
            SmallRng::seed_from_u64(4),
        )
        .expect("battle should start");

        engine.end_player_phase().expect("end player phase");
        assert_eq!(engine.snapshot().enemy_energy, 4);
        assert_eq!(engine.snapshot().enemy_max_energy, 3);
        assert!(!engine.state().enemy_energy.reserve);
    }

    #[test]
    fn preview_matches_next_tick() {
        let mut engine = start(31);
        engine.end_player_phase().expect("end player phase");

        let preview = engine.preview_enemy_choice().expect("enemy phase is active");
        let events = engine.tick_enemy_phase().expect("tick");
        let played = events.iter().find_map(|event| match event {
            BattleEvent::CardPlayed {
                side: Side::Enemy,
                instance_id,
                ..
            } => Some(*instance_id),
            _ => None,
        });
        assert_eq!(preview.instance_id, played);
    }

    #[test]
    fn same_seed_replays_identically() {
        let run = |seed| {
            let mut engine = start(seed);
            for _ in 0..4 {
                if engine.state().is_finished() {
                    break;
                }
                let _ = engine.end_player_phase();
                let _ = engine.run_enemy_phase();
            }
            engine.state().event_log.clone()
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn enemy_stops_the_instant_player_dies() {
        let weak_player = CombatantTemplate::new("Fragile", Element::Wood, Polarity::Yang, 1);
        let mut cards = Vec::new();
        for element in Element::ALL {
            for polarity in Polarity::ALL {
                let id = format!("{element}-{polarity}").to_lowercase();
                cards.push(
                    CardDefinition::new(id, "Jab", element, polarity, 0, CardType::Attack)
                        .with_damage(5),
                );
            }
        }
        let catalog = CardCatalog::new(cards).expect("jab catalog");
        let (mut engine, _) = TurnEngine::start_battle(&weak_player, &enemy(), catalog, 2)
            .expect("battle should start");

        engine.end_player_phase().expect("end player phase");
        let events = engine.run_enemy_phase().expect("enemy phase");

        assert_eq!(engine.phase(), BattlePhase::EnemyVictory);
        assert_eq!(engine.snapshot().terminal, BattleOutcome::EnemyVictory);
        let plays = events
            .iter()
            .filter(|event| matches!(event, BattleEvent::CardPlayed { .. }))
            .count();
        assert_eq!(plays, 1, "zero-cost cards remain but the battle is over");
        assert_eq!(engine.snapshot().enemy_hand_ids.len(), 2);
        assert!(events
            .iter()
            .any(|event| matches!(event, BattleEvent::BattleEnded { winner: Side::Enemy })));
        assert_eq!(engine.end_player_phase(), Err(RuleError::BattleFinished));
    }

    #[test]
    fn burn_ticks_at_round_end_and_can_finish_battle() {
        let mut cards = Vec::new();
        for element in Element::ALL {
            for polarity in Polarity::ALL {
                let id = format!("{element}-{polarity}").to_lowercase();
                cards.push(
                    CardDefinition::new(id, "Cinder", element, polarity, 0, CardType::Power)
                        .with_burn(40, 3),
                );
            }
        }
        let catalog = CardCatalog::new(cards).expect("cinder catalog");
        let (mut engine, _) = TurnEngine::start_battle(&player(), &enemy(), catalog, 6)
            .expect("battle should start");

        let card = engine.state().hands.player[0].id;
        let events = engine.submit_player_card(card).expect("cinder is free");
        assert!(events.iter().any(|event| matches!(
            event,
            BattleEvent::StatusApplied {
                side: Side::Enemy,
                status: StatusKind::Burn,
                magnitude: 40,
                turns: 3
            }
        )));

        engine.end_player_phase().expect("end player phase");
        engine.run_enemy_phase().expect("round 1 enemy phase");
        // enemy burned once (40), player burned by enemy's cinders
        assert_eq!(engine.state().enemy.current_hp(), 60);

        while !engine.state().is_finished() {
            if engine.phase() == BattlePhase::PlayerAction {
                engine.end_player_phase().expect("end player phase");
            }
            engine.run_enemy_phase().expect("enemy phase");
        }
        assert!(engine.state().is_finished());
        assert!(engine.snapshot().round <= 3);
    }

    #[test]
    fn incomplete_catalog_or_bad_template_refuses_to_start() {
        let partial = CardCatalog::new(vec![CardDefinition::new(
            "solo",
            "Solo",
            Element::Fire,
            Polarity::Yang,
            1,
            CardType::Attack,
        )
        .with_damage(3)])
        .expect("single card catalog");
        assert!(matches!(
            TurnEngine::start_battle(&player(), &enemy(), partial, 1),
            Err(RuleError::Catalog {
                error: CatalogError::IncompleteCatalog { .. }
            })
        ));

        let dead = CombatantTemplate::new("Ghost", Element::Metal, Polarity::Yin, 0);
        assert!(matches!(
            TurnEngine::start_battle(&dead, &enemy(), CardCatalog::standard(), 1),
            Err(RuleError::InvalidTemplate { .. })
        ));
    }
}
