pub mod ai;
pub mod game;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{choose_affordable, decide, EnemyDecision};
pub use game::{
    BattleConfig, BattleEvent, BattleOutcome, BattlePhase, BattleSnapshot, BattleState, CardCatalog,
    CardDefinition, CardId, CardInstance, CardPlaySummary, CardResolver, CardType, CatalogError,
    Combatant, CombatantTemplate, Element, InstanceId, Multiplier, Polarity, RuleError,
    RuleResolution, Side, StatusKind, TurnEngine,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    init_logger();
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn parse_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(serde_to_js_error)
}

/// 面向前端的战斗引擎，所有命令返回 `RuleResolution` 的 JSON。
#[wasm_bindgen]
pub struct BattleEngine {
    engine: TurnEngine,
}

#[wasm_bindgen]
impl BattleEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(
        player_json: &str,
        enemy_json: &str,
        catalog_json: Option<String>,
        seed: Option<u64>,
        config_json: Option<String>,
    ) -> Result<BattleEngine, JsValue> {
        let player: CombatantTemplate = parse_json(player_json)?;
        let enemy: CombatantTemplate = parse_json(enemy_json)?;
        let catalog = match catalog_json {
            Some(json) => CardCatalog::from_json(&json).map_err(to_js_error)?,
            None => CardCatalog::standard(),
        };
        let config = match config_json {
            Some(json) => parse_json(&json)?,
            None => BattleConfig::default(),
        };
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let (engine, _) = TurnEngine::start_with_config(&player, &enemy, catalog, config, rng)
            .map_err(to_js_error)?;
        Ok(BattleEngine { engine })
    }

    pub fn submit_player_card(&mut self, instance_id: InstanceId) -> Result<String, JsValue> {
        let events = self
            .engine
            .submit_player_card(instance_id)
            .map_err(to_js_error)?;
        make_resolution_json(RuleResolution::new(self.engine.state(), events))
    }

    pub fn end_player_phase(&mut self) -> Result<String, JsValue> {
        let events = self.engine.end_player_phase().map_err(to_js_error)?;
        make_resolution_json(RuleResolution::new(self.engine.state(), events))
    }

    pub fn tick_enemy_phase(&mut self) -> Result<String, JsValue> {
        let events = self.engine.tick_enemy_phase().map_err(to_js_error)?;
        make_resolution_json(RuleResolution::new(self.engine.state(), events))
    }

    pub fn run_enemy_phase(&mut self) -> Result<String, JsValue> {
        let events = self.engine.run_enemy_phase().map_err(to_js_error)?;
        make_resolution_json(RuleResolution::new(self.engine.state(), events))
    }

    /// 延迟 `delay_ms` 毫秒后给出敌方下一步的预测，不修改战斗状态。
    pub fn think_enemy(&self, delay_ms: Option<u32>) -> Promise {
        let engine = self.engine.clone();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = engine.preview_enemy_choice().map_err(to_js_error)?;
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.engine.snapshot()).map_err(JsValue::from)
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.snapshot()).map_err(serde_to_js_error)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.engine.state()).map_err(serde_to_js_error)
    }

    pub fn event_log_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.state().event_log).map_err(serde_to_js_error)
    }

    pub fn catalog_json(&self) -> Result<String, JsValue> {
        self.engine.catalog().to_json().map_err(serde_to_js_error)
    }

    pub fn card_json(&self, card_id: &str) -> Result<String, JsValue> {
        let card = self.engine.catalog().get(card_id).ok_or_else(|| {
            to_js_error(RuleError::UnknownCard {
                card_id: card_id.to_owned(),
            })
        })?;
        serde_json::to_string(card).map_err(serde_to_js_error)
    }
}

/// 返回标准十张卡牌库的 JSON。
#[wasm_bindgen(js_name = "standardCatalog")]
pub fn standard_catalog() -> Result<String, JsValue> {
    CardCatalog::standard().to_json().map_err(serde_to_js_error)
}

/// 校验卡牌库 JSON，失败时返回结构化的 `CatalogError`。
#[wasm_bindgen(js_name = "validateCatalog")]
pub fn validate_catalog(json: &str) -> Result<(), JsValue> {
    let catalog = CardCatalog::from_json(json).map_err(to_js_error)?;
    catalog.ensure_complete().map_err(to_js_error)
}

#[wasm_bindgen(js_name = "elementMultiplier")]
pub fn element_multiplier(
    user_polarity: JsValue,
    user_element: JsValue,
    card_element: JsValue,
    card_polarity: JsValue,
    target_element: JsValue,
) -> Result<f64, JsValue> {
    let user_polarity: Polarity = from_value(user_polarity).map_err(JsValue::from)?;
    let user_element: Element = from_value(user_element).map_err(JsValue::from)?;
    let card_element: Element = from_value(card_element).map_err(JsValue::from)?;
    let card_polarity: Polarity = from_value(card_polarity).map_err(JsValue::from)?;
    let target_element: Element = from_value(target_element).map_err(JsValue::from)?;
    Ok(game::multiplier(user_polarity, user_element, card_element, card_polarity, target_element).value())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

#[cfg(feature = "console_log")]
fn init_logger() {
    let _ = console_log::init_with_level(log::Level::Debug);
}

#[cfg(not(feature = "console_log"))]
fn init_logger() {}
