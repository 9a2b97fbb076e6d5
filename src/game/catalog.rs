//! 卡牌定义与卡牌库。

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::element::{Element, Polarity};

/// 卡牌定义的唯一标识。
pub type CardId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CardType {
    Attack,
    Skill,
    Power,
}

/// 不可变的卡牌定义，由卡牌库持有。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardDefinition {
    pub id: CardId,
    #[serde(default)]
    pub name: String,
    pub element: Element,
    pub polarity: Polarity,
    pub cost: u8,
    #[serde(rename = "type")]
    pub card_type: CardType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub base_damage: i32,
    #[serde(default)]
    pub bonus_damage: i32,
    #[serde(default)]
    pub element_bonus: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_element: Option<Element>,

    #[serde(default)]
    pub heal: i32,
    #[serde(default)]
    pub base_block: i32,
    #[serde(default)]
    pub conditional_block: i32,

    #[serde(default)]
    pub burn_tick: i32,
    #[serde(default)]
    pub burn_turns: i32,

    #[serde(default)]
    pub reduce_per_hit: i32,
    #[serde(default)]
    pub hit_count: i32,

    #[serde(default)]
    pub wet_turns: i32,
    #[serde(default)]
    pub weak_turns: i32,
    #[serde(default)]
    pub vulnerable_turns: i32,
}

impl CardDefinition {
    pub fn new(
        id: impl Into<CardId>,
        name: impl Into<String>,
        element: Element,
        polarity: Polarity,
        cost: u8,
        card_type: CardType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            element,
            polarity,
            cost,
            card_type,
            description: String::new(),
            base_damage: 0,
            bonus_damage: 0,
            element_bonus: 0.0,
            bonus_element: None,
            heal: 0,
            base_block: 0,
            conditional_block: 0,
            burn_tick: 0,
            burn_turns: 0,
            reduce_per_hit: 0,
            hit_count: 0,
            wet_turns: 0,
            weak_turns: 0,
            vulnerable_turns: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_damage(mut self, base: i32) -> Self {
        self.base_damage = base;
        self
    }

    pub fn with_bonus_damage(mut self, bonus: i32) -> Self {
        self.bonus_damage = bonus;
        self
    }

    pub fn with_element_bonus(mut self, rate: f64, trigger: Option<Element>) -> Self {
        self.element_bonus = rate;
        self.bonus_element = trigger;
        self
    }

    pub fn with_heal(mut self, amount: i32) -> Self {
        self.heal = amount;
        self
    }

    pub fn with_block(mut self, base: i32, conditional: i32) -> Self {
        self.base_block = base;
        self.conditional_block = conditional;
        self
    }

    pub fn with_burn(mut self, tick: i32, turns: i32) -> Self {
        self.burn_tick = tick;
        self.burn_turns = turns;
        self
    }

    pub fn with_shield(mut self, reduce_per_hit: i32, hits: i32) -> Self {
        self.reduce_per_hit = reduce_per_hit;
        self.hit_count = hits;
        self
    }

    pub fn with_wet(mut self, turns: i32) -> Self {
        self.wet_turns = turns;
        self
    }

    pub fn with_weak(mut self, turns: i32) -> Self {
        self.weak_turns = turns;
        self
    }

    pub fn with_vulnerable(mut self, turns: i32) -> Self {
        self.vulnerable_turns = turns;
        self
    }

    /// 元素追加伤害的触发元素，未指定时为本卡元素所克制的元素。
    pub fn bonus_trigger(&self) -> Element {
        self.bonus_element
            .unwrap_or_else(|| self.element.overcome_target())
    }

    /// 元素追加比例换算为万分比，之后只做整数运算。
    pub fn element_bonus_basis_points(&self) -> u32 {
        // float-to-int casts saturate, non-finite rates are rejected by validate
        (self.element_bonus * 10_000.0).round() as u32
    }

    pub fn has_shield(&self) -> bool {
        self.reduce_per_hit > 0 && self.hit_count > 0
    }

    pub fn has_burn(&self) -> bool {
        self.burn_tick > 0 && self.burn_turns > 0
    }

    fn malformed(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::MalformedCardDefinition {
            card_id: self.id.clone(),
            reason: reason.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(self.malformed("empty card id"));
        }

        let numeric = [
            ("base_damage", self.base_damage),
            ("bonus_damage", self.bonus_damage),
            ("heal", self.heal),
            ("base_block", self.base_block),
            ("conditional_block", self.conditional_block),
            ("burn_tick", self.burn_tick),
            ("burn_turns", self.burn_turns),
            ("reduce_per_hit", self.reduce_per_hit),
            ("hit_count", self.hit_count),
            ("wet_turns", self.wet_turns),
            ("weak_turns", self.weak_turns),
            ("vulnerable_turns", self.vulnerable_turns),
        ];
        if let Some((field, value)) = numeric.iter().find(|(_, value)| *value < 0) {
            return Err(self.malformed(format!("{field} is negative ({value})")));
        }
        if !self.element_bonus.is_finite() || self.element_bonus < 0.0 {
            return Err(self.malformed("element_bonus must be a finite non-negative rate"));
        }

        if (self.burn_tick > 0) != (self.burn_turns > 0) {
            return Err(self.malformed("burn_tick and burn_turns must be set together"));
        }
        if (self.reduce_per_hit > 0) != (self.hit_count > 0) {
            return Err(self.malformed("reduce_per_hit and hit_count must be set together"));
        }
        if self.base_damage == 0 && (self.bonus_damage > 0 || self.element_bonus > 0.0) {
            return Err(self.malformed("bonus damage requires base_damage"));
        }

        let has_status = self.has_burn()
            || self.wet_turns > 0
            || self.weak_turns > 0
            || self.vulnerable_turns > 0;
        match self.card_type {
            CardType::Attack if self.base_damage == 0 => {
                Err(self.malformed("attack card requires base_damage"))
            }
            CardType::Skill
                if self.heal == 0
                    && self.base_block == 0
                    && self.conditional_block == 0
                    && !self.has_shield() =>
            {
                Err(self.malformed("skill card requires heal, block or shield"))
            }
            CardType::Power if !has_status => {
                Err(self.malformed("power card requires a status effect"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum CatalogError {
    #[error("card {duplicate} claims ({element}, {polarity}) already held by {existing}")]
    DuplicateCatalogPair {
        element: Element,
        polarity: Polarity,
        existing: CardId,
        duplicate: CardId,
    },
    #[error("card id {card_id} registered twice")]
    DuplicateCardId { card_id: CardId },
    #[error("card {card_id} is malformed: {reason}")]
    MalformedCardDefinition { card_id: CardId, reason: String },
    #[error("catalog has no card for {} pair(s)", .missing.len())]
    IncompleteCatalog { missing: Vec<(Element, Polarity)> },
}

/// 卡牌库：按 id 与 (元素, 阴阳) 两种方式索引。
#[derive(Debug, Clone, Default, Serialize)]
pub struct CardCatalog {
    cards: BTreeMap<CardId, CardDefinition>,
    #[serde(skip)]
    by_pair: BTreeMap<(Element, Polarity), CardId>,
}

impl CardCatalog {
    pub fn new(definitions: Vec<CardDefinition>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for definition in definitions {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    fn register(&mut self, definition: CardDefinition) -> Result<(), CatalogError> {
        definition.validate()?;

        if self.cards.contains_key(&definition.id) {
            return Err(CatalogError::DuplicateCardId {
                card_id: definition.id,
            });
        }
        let pair = (definition.element, definition.polarity);
        if let Some(existing) = self.by_pair.get(&pair) {
            return Err(CatalogError::DuplicateCatalogPair {
                element: pair.0,
                polarity: pair.1,
                existing: existing.clone(),
                duplicate: definition.id,
            });
        }

        self.by_pair.insert(pair, definition.id.clone());
        self.cards.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<CardDefinition> =
            serde_json::from_str(json).map_err(|error| CatalogError::MalformedCardDefinition {
                card_id: String::new(),
                reason: error.to_string(),
            })?;
        Self::new(definitions)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let definitions: Vec<&CardDefinition> = self.cards.values().collect();
        serde_json::to_string(&definitions)
    }

    pub fn standard() -> Self {
        STANDARD_CATALOG.clone()
    }

    pub fn get(&self, id: &str) -> Option<&CardDefinition> {
        self.cards.get(id)
    }

    pub fn by_pair(&self, element: Element, polarity: Polarity) -> Option<&CardDefinition> {
        self.by_pair
            .get(&(element, polarity))
            .and_then(|id| self.cards.get(id))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values()
    }

    pub fn missing_pairs(&self) -> Vec<(Element, Polarity)> {
        Element::ALL
            .iter()
            .flat_map(|element| Polarity::ALL.iter().map(move |polarity| (*element, *polarity)))
            .filter(|pair| !self.by_pair.contains_key(pair))
            .collect()
    }

    pub fn ensure_complete(&self) -> Result<(), CatalogError> {
        let missing = self.missing_pairs();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::IncompleteCatalog { missing })
        }
    }

    /// 掷五行与阴阳骰，取对应的卡牌定义。
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Option<&CardDefinition> {
        let element = *Element::ALL.choose(rng)?;
        let polarity = if rng.gen_bool(0.5) {
            Polarity::Yang
        } else {
            Polarity::Yin
        };
        self.by_pair(element, polarity)
    }
}

static STANDARD_CATALOG: Lazy<CardCatalog> = Lazy::new(|| {
    CardCatalog::new(standard_definitions()).unwrap_or_else(|error| {
        log::error!("standard catalog rejected: {error}");
        CardCatalog::default()
    })
});

fn standard_definitions() -> Vec<CardDefinition> {
    use CardType::*;
    use Element::*;
    use Polarity::*;

    vec![
        CardDefinition::new("yang_wood_vine_surge", "Vine Surge", Wood, Yang, 1, Attack)
            .with_description("Deal 6. If you have Block, deal 3 more. +25% against Earth.")
            .with_damage(6)
            .with_bonus_damage(3)
            .with_element_bonus(0.25, None),
        CardDefinition::new("yin_wood_verdant_mend", "Verdant Mend", Wood, Yin, 1, Skill)
            .with_description("Heal 6.")
            .with_heal(6),
        CardDefinition::new("yang_fire_blazing_strike", "Blazing Strike", Fire, Yang, 2, Attack)
            .with_description("Deal 8. Burn 3 for 2 turns.")
            .with_damage(8)
            .with_burn(3, 2),
        CardDefinition::new("yin_fire_smoldering_hex", "Smoldering Hex", Fire, Yin, 1, Power)
            .with_description("Burn 4 for 3 turns. Vulnerable 1.")
            .with_burn(4, 3)
            .with_vulnerable(1),
        CardDefinition::new("yang_earth_stone_bulwark", "Stone Bulwark", Earth, Yang, 1, Skill)
            .with_description("Gain 8 Block. Gain 4 more if the enemy is Wet.")
            .with_block(8, 4),
        CardDefinition::new("yin_earth_earthen_seal", "Earthen Seal", Earth, Yin, 1, Power)
            .with_description("Weak 2: their attacks deal 25% less.")
            .with_weak(2),
        CardDefinition::new("yang_metal_iron_cleave", "Iron Cleave", Metal, Yang, 2, Attack)
            .with_description("Deal 10. Vulnerable 1.")
            .with_damage(10)
            .with_vulnerable(1),
        CardDefinition::new("yin_metal_gilded_guard", "Gilded Guard", Metal, Yin, 1, Skill)
            .with_description("Gain 5 Block.")
            .with_block(5, 0),
        CardDefinition::new("yang_water_tide_calling", "Tide Calling", Water, Yang, 1, Attack)
            .with_description("Deal 5. Wet 2.")
            .with_damage(5)
            .with_wet(2),
        CardDefinition::new("yin_water_flowing_veil", "Flowing Veil", Water, Yin, 1, Skill)
            .with_description("Until round end, the next 2 hits deal 4 less.")
            .with_shield(4, 2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn standard_catalog_covers_every_pair() {
        let catalog = CardCatalog::standard();
        assert_eq!(catalog.len(), 10);
        catalog
            .ensure_complete()
            .expect("standard catalog should cover all ten pairs");

        let vine = catalog
            .by_pair(Element::Wood, Polarity::Yang)
            .expect("vine surge should be registered");
        assert_eq!(vine.id, "yang_wood_vine_surge");
        assert_eq!(vine.bonus_trigger(), Element::Earth);
    }

    #[test]
    fn duplicate_pair_refuses_to_build() {
        let first = CardDefinition::new("a", "A", Element::Fire, Polarity::Yang, 1, CardType::Attack)
            .with_damage(4);
        let second = CardDefinition::new("b", "B", Element::Fire, Polarity::Yang, 2, CardType::Attack)
            .with_damage(9);

        let error = CardCatalog::new(vec![first, second]).expect_err("pair clash must fail");
        assert_eq!(
            error,
            CatalogError::DuplicateCatalogPair {
                element: Element::Fire,
                polarity: Polarity::Yang,
                existing: "a".into(),
                duplicate: "b".into(),
            }
        );
    }

    #[test]
    fn duplicate_id_refuses_to_build() {
        let first = CardDefinition::new("a", "A", Element::Fire, Polarity::Yang, 1, CardType::Attack)
            .with_damage(4);
        let second = CardDefinition::new("a", "A2", Element::Water, Polarity::Yin, 1, CardType::Skill)
            .with_heal(2);

        let error = CardCatalog::new(vec![first, second]).expect_err("id clash must fail");
        assert!(matches!(error, CatalogError::DuplicateCardId { .. }));
    }

    #[test]
    fn malformed_definitions_are_rejected() {
        let no_damage =
            CardDefinition::new("x", "X", Element::Metal, Polarity::Yin, 1, CardType::Attack);
        assert!(matches!(
            no_damage.validate(),
            Err(CatalogError::MalformedCardDefinition { .. })
        ));

        let half_burn = CardDefinition::new("y", "Y", Element::Fire, Polarity::Yin, 1, CardType::Power)
            .with_burn(3, 0)
            .with_weak(1);
        assert!(half_burn.validate().is_err());

        let empty_skill =
            CardDefinition::new("z", "Z", Element::Earth, Polarity::Yang, 0, CardType::Skill);
        assert!(empty_skill.validate().is_err());

        let negative = CardDefinition::new("n", "N", Element::Earth, Polarity::Yang, 0, CardType::Skill)
            .with_heal(-3);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn json_catalog_round_trip_and_missing_fields() {
        let json = r#"[
            {"id": "spark", "element": "Fire", "polarity": "Yang", "cost": 1, "type": "Attack", "base_damage": 4},
            {"id": "mist", "element": "Water", "polarity": "Yin", "cost": 0, "type": "Power", "wet_turns": 2}
        ]"#;
        let catalog = CardCatalog::from_json(json).expect("catalog json should parse");
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog
                .by_pair(Element::Water, Polarity::Yin)
                .map(|card| card.id.as_str()),
            Some("mist")
        );
        assert!(matches!(
            catalog.ensure_complete(),
            Err(CatalogError::IncompleteCatalog { ref missing }) if missing.len() == 8
        ));

        let missing_cost = r#"[{"id": "bad", "element": "Fire", "polarity": "Yin", "type": "Attack", "base_damage": 1}]"#;
        assert!(matches!(
            CardCatalog::from_json(missing_cost),
            Err(CatalogError::MalformedCardDefinition { .. })
        ));
    }

    #[test]
    fn seeded_draws_are_replayable() {
        let catalog = CardCatalog::standard();
        let mut first = SmallRng::seed_from_u64(7);
        let mut second = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let a = catalog.draw(&mut first).map(|card| card.id.clone());
            let b = catalog.draw(&mut second).map(|card| card.id.clone());
            assert!(a.is_some(), "complete catalog always resolves a draw");
            assert_eq!(a, b);
        }
    }
}
