//! Weighted scoring and tier classification.
//!
//! Pure and deterministic. The weights are a deployment-time constant; they are
//! exposed for documentation only and never accepted as an input.

use crate::model::{Scorecard, StoredEntity};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-dimension weights. They sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub active_aggression: f64,
    pub attack_range: f64,
    pub unpredictability: f64,
    pub special_ability: f64,
    pub historical_threat: f64,
    pub encounter_probability: f64,
}

/// The fixed weights used by [`score`].
pub const WEIGHTS: TierWeights = TierWeights {
    active_aggression: 0.25,
    attack_range: 0.20,
    unpredictability: 0.20,
    special_ability: 0.15,
    historical_threat: 0.10,
    encounter_probability: 0.10,
};

/// Ordinal risk tier, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    pub const ALL: [Tier; 5] = [Tier::S, Tier::A, Tier::B, Tier::C, Tier::D];

    /// Half-open thresholds evaluated top-down.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => Tier::S,
            s if s >= 7.0 => Tier::A,
            s if s >= 5.0 => Tier::B,
            s if s >= 2.0 => Tier::C,
            _ => Tier::D,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "S" => Ok(Tier::S),
            "A" => Ok(Tier::A),
            "B" => Ok(Tier::B),
            "C" => Ok(Tier::C),
            "D" => Ok(Tier::D),
            _ => Err(StoreError::ValidationGap(format!("unknown tier `{raw}`"))),
        }
    }
}

/// Weighted sum of the scorecard dimensions.
pub fn score(scorecard: &Scorecard) -> f64 {
    scorecard.active_aggression * WEIGHTS.active_aggression
        + scorecard.attack_range * WEIGHTS.attack_range
        + scorecard.unpredictability * WEIGHTS.unpredictability
        + scorecard.special_ability * WEIGHTS.special_ability
        + scorecard.historical_threat * WEIGHTS.historical_threat
        + scorecard.encounter_probability * WEIGHTS.encounter_probability
}

pub fn classify(scorecard: &Scorecard) -> Tier {
    Tier::from_score(score(scorecard))
}

/// Entity annotated with its computed score and tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEntity {
    #[serde(flatten)]
    pub entity: StoredEntity,
    pub score: f64,
    pub tier: Tier,
}

impl From<StoredEntity> for ClassifiedEntity {
    fn from(entity: StoredEntity) -> Self {
        let score = score(&entity.scorecard.scores);
        Self {
            tier: Tier::from_score(score),
            score,
            entity,
        }
    }
}
