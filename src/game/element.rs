//! 五行相克关系与伤害倍率。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 五行元素。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    /// 本元素所克制的元素：木克土、土克水、水克火、火克金、金克木。
    pub fn overcome_target(self) -> Element {
        match self {
            Element::Wood => Element::Earth,
            Element::Earth => Element::Water,
            Element::Water => Element::Fire,
            Element::Fire => Element::Metal,
            Element::Metal => Element::Wood,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 阴阳属性。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Polarity {
    Yin,
    Yang,
}

impl Polarity {
    pub const ALL: [Polarity; 2] = [Polarity::Yin, Polarity::Yang];
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub fn overcomes(attacker: Element, defender: Element) -> bool {
    attacker.overcome_target() == defender
}

const UNIT: u64 = 10;
const ALIGNED: u64 = 11;
const ADVANTAGE: u64 = 12;
const DISADVANTAGE: u64 = 8;
const WEAK_NUMERATOR: u64 = 3;
const WEAK_DENOMINATOR: u64 = 4;
const BASIS_POINTS: u64 = 10_000;

/// Damage multiplier kept as an exact integer ratio so ceiling rounding never
/// picks up float drift (10 x 1.1 is 11, not 12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiplier {
    numerator: u64,
    denominator: u64,
}

impl Multiplier {
    pub const NEUTRAL: Multiplier = Multiplier {
        numerator: 1,
        denominator: 1,
    };

    fn scale(self, tenths: u64) -> Self {
        Self {
            numerator: self.numerator * tenths,
            denominator: self.denominator * UNIT,
        }
    }

    /// 虚弱时出牌伤害 x0.75。
    pub fn weakened(self) -> Self {
        Self {
            numerator: self.numerator * WEAK_NUMERATOR,
            denominator: self.denominator * WEAK_DENOMINATOR,
        }
    }

    /// Exact ratio for a rate given in basis points (2500 is 0.25).
    pub fn from_basis_points(basis_points: u32) -> Self {
        Self {
            numerator: u64::from(basis_points),
            denominator: BASIS_POINTS,
        }
    }

    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Ceiling of `base * multiplier`; negative bases are treated as zero.
    pub fn apply(&self, base: i32) -> i32 {
        if base <= 0 {
            return 0;
        }
        let scaled = (base as u64 * self.numerator).div_ceil(self.denominator);
        i32::try_from(scaled).unwrap_or(i32::MAX)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

pub fn multiplier(
    user_polarity: Polarity,
    user_element: Element,
    card_element: Element,
    card_polarity: Polarity,
    target_element: Element,
) -> Multiplier {
    let mut m = Multiplier::NEUTRAL;
    if user_polarity == card_polarity {
        m = m.scale(ALIGNED);
        if user_element == card_element {
            m = m.scale(ALIGNED);
        }
    }
    if overcomes(card_element, target_element) {
        m = m.scale(ADVANTAGE);
    }
    if overcomes(target_element, card_element) {
        m = m.scale(DISADVANTAGE);
    }
    m
}

pub fn apply_multiplier(base: i32, m: Multiplier) -> i32 {
    m.apply(base)
}
