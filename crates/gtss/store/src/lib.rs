//! GTSS entity registry core.
//!
//! This crate owns the persisted entity records and their six-dimension
//! scorecards:
//! - [`EntityStore`] is the storage contract (create, lookup, paging,
//!   change-aware partial update, delete, tier filtering)
//! - [`tier`] turns a scorecard into a weighted score and an S..D tier
//! - [`memory`] and `sqlite` are the two backends
//!
//! Inputs are expected to be shape-validated by the caller. The store still
//! enforces its own invariants: name uniqueness, the 1:1 entity/scorecard
//! pairing, and write-only-on-change updates.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

#[cfg(test)]
mod contract;
mod diff;
mod error;
pub mod memory;
mod model;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod tier;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryEntityStore;
pub use model::{
    EntityId, EntityPatch, NewEntity, Page, PageRequest, Scorecard, ScorecardPatch, StoredEntity,
    StoredScorecard,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEntityStore;
pub use tier::{classify, score, ClassifiedEntity, Tier, TierWeights, WEIGHTS};
pub use traits::EntityStore;
