//! Card (ammo) reference data
//!
//! Each card in the shared hand names an ammo type. The table that maps a kind
//! to its cost and payload is loaded once with the match settings and never
//! mutated during play.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rotate_degrees;

/// Ammo types a card can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    /// Single shell, direct-hit damage
    Standard,
    /// Single shell with area damage
    Splash,
    /// Three shells fanned out around the aim direction
    Spread,
}

impl CardKind {
    pub const ALL: [CardKind; 3] = [CardKind::Standard, CardKind::Splash, CardKind::Spread];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Standard => "Standard",
            CardKind::Splash => "Splash",
            CardKind::Spread => "Spread",
        }
    }
}

/// Cost and behavioural payload of one card kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSpec {
    /// Energy charged when the card is selected
    pub cost: u32,
    /// Projectiles spawned per shot
    pub count: u32,
    /// Angle between neighbouring projectiles (degrees)
    pub spread_degrees: f32,
    /// Damage dealt to each unit hit
    pub damage: u32,
    /// Area-of-effect radius (0 = direct hit only)
    pub splash_radius: f32,
    /// Impulse magnitude at the impact centre
    pub force: f32,
}

impl CardSpec {
    /// Launch velocities for one volley: the aimed shot first, then pairs
    /// fanned out alternately above and below it.
    pub fn volley_velocities(&self, aimed: Vec2) -> Vec<Vec2> {
        let count = self.count.max(1);
        let mut out = Vec::with_capacity(count as usize);
        out.push(aimed);
        for i in 1..count {
            let step = i.div_ceil(2) as f32;
            let sign = if i % 2 == 1 { 1.0 } else { -1.0 };
            out.push(rotate_degrees(aimed, sign * step * self.spread_degrees));
        }
        out
    }
}

/// Immutable card reference table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardTable {
    pub standard: CardSpec,
    pub splash: CardSpec,
    pub spread: CardSpec,
}

impl Default for CardTable {
    fn default() -> Self {
        Self {
            standard: CardSpec {
                cost: 1,
                count: 1,
                spread_degrees: 0.0,
                damage: 20,
                splash_radius: 0.0,
                force: 10.0,
            },
            splash: CardSpec {
                cost: 2,
                count: 1,
                spread_degrees: 0.0,
                damage: 30,
                splash_radius: 5.0,
                force: 15.0,
            },
            spread: CardSpec {
                cost: 3,
                count: 3,
                spread_degrees: 10.0,
                damage: 20,
                splash_radius: 0.0,
                force: 10.0,
            },
        }
    }
}

impl CardTable {
    pub fn spec(&self, kind: CardKind) -> &CardSpec {
        match kind {
            CardKind::Standard => &self.standard,
            CardKind::Splash => &self.splash,
            CardKind::Spread => &self.spread,
        }
    }

    #[inline]
    pub fn cost(&self, kind: CardKind) -> u32 {
        self.spec(kind).cost
    }

    /// Cheapest card in `hand`, if any
    pub fn cheapest_cost(&self, hand: &[CardKind]) -> Option<u32> {
        hand.iter().map(|&k| self.cost(k)).min()
    }

    /// Draw a uniformly random card kind
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> CardKind {
        CardKind::ALL[rng.random_range(0..CardKind::ALL.len())]
    }
}
