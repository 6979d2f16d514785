use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Surrogate key assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The six rated dimensions, each expected in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scorecard {
    pub active_aggression: f64,
    pub attack_range: f64,
    pub unpredictability: f64,
    pub special_ability: f64,
    pub historical_threat: f64,
    pub encounter_probability: f64,
}

impl Scorecard {
    /// Scorecard with every dimension set to `value`.
    pub fn uniform(value: f64) -> Self {
        Self {
            active_aggression: value,
            attack_range: value,
            unpredictability: value,
            special_ability: value,
            historical_threat: value,
            encounter_probability: value,
        }
    }

    /// Dimension names paired with their values, in declaration order.
    pub fn dimensions(&self) -> [(&'static str, f64); 6] {
        [
            ("active_aggression", self.active_aggression),
            ("attack_range", self.attack_range),
            ("unpredictability", self.unpredictability),
            ("special_ability", self.special_ability),
            ("historical_threat", self.historical_threat),
            ("encounter_probability", self.encounter_probability),
        ]
    }
}

/// Creation payload: the entity fields plus its scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntity {
    pub name: String,
    pub category: String,
    pub affiliation: String,
    pub notes: String,
    pub image_ref: String,
    pub scorecard: Scorecard,
}

/// Persisted scorecard with its own modification time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScorecard {
    #[serde(flatten)]
    pub scores: Scorecard,
    pub last_update: DateTime<Utc>,
}

/// Persisted entity joined with its scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntity {
    pub id: EntityId,
    pub name: String,
    pub category: String,
    pub affiliation: String,
    pub notes: String,
    pub image_ref: String,
    pub last_update: DateTime<Utc>,
    pub scorecard: StoredScorecard,
}

/// Partial update. `None` means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub affiliation: Option<String>,
    pub notes: Option<String>,
    pub image_ref: Option<String>,
    pub scorecard: Option<ScorecardPatch>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorecardPatch {
    pub active_aggression: Option<f64>,
    pub attack_range: Option<f64>,
    pub unpredictability: Option<f64>,
    pub special_ability: Option<f64>,
    pub historical_threat: Option<f64>,
    pub encounter_probability: Option<f64>,
}

impl ScorecardPatch {
    /// Populated slots only.
    pub fn populated(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("active_aggression", self.active_aggression),
            ("attack_range", self.attack_range),
            ("unpredictability", self.unpredictability),
            ("special_ability", self.special_ability),
            ("historical_threat", self.historical_threat),
            ("encounter_probability", self.encounter_probability),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }
}

/// Page of results plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages: total.div_ceil(u64::from(request.page_size.max(1))),
        }
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}
