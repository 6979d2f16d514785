//! Change-aware patch application shared by every backend.

use crate::model::{EntityPatch, NewEntity, ScorecardPatch, StoredEntity};
use crate::{StoreError, StoreResult};
use chrono::{DateTime, Utc};

/// Dirty flags produced by [`apply_patch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub main_changed: bool,
    pub scorecard_changed: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        !self.main_changed && !self.scorecard_changed
    }
}

pub fn check_new(entity: &NewEntity) -> StoreResult<()> {
    if entity.name.trim().is_empty() {
        return Err(StoreError::ValidationGap("entity name is empty".to_string()));
    }
    if let Some((field, value)) = entity
        .scorecard
        .dimensions()
        .into_iter()
        .find(|(_, v)| !v.is_finite())
    {
        return Err(StoreError::ValidationGap(format!(
            "scorecard field `{field}` is not a finite number ({value})"
        )));
    }
    Ok(())
}

/// Reject patches that could not have come through the request boundary.
pub fn check_patch(patch: &EntityPatch) -> StoreResult<()> {
    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(StoreError::ValidationGap(
                "patch renames entity to an empty name".to_string(),
            ));
        }
    }
    if let Some(scorecard) = &patch.scorecard {
        if let Some((field, value)) = scorecard.populated().find(|(_, v)| !v.is_finite()) {
            return Err(StoreError::ValidationGap(format!(
                "scorecard field `{field}` is not a finite number ({value})"
            )));
        }
    }
    Ok(())
}

/// Apply the populated slots of `patch` to `target`, touching only values that
/// differ, and refresh each sub-record's `last_update` only if it changed.
pub fn apply_patch(target: &mut StoredEntity, patch: &EntityPatch, now: DateTime<Utc>) -> ChangeSet {
    let mut changes = ChangeSet::default();

    changes.main_changed |= assign("name", &mut target.name, &patch.name);
    changes.main_changed |= assign("category", &mut target.category, &patch.category);
    changes.main_changed |= assign("affiliation", &mut target.affiliation, &patch.affiliation);
    changes.main_changed |= assign("notes", &mut target.notes, &patch.notes);
    changes.main_changed |= assign("image_ref", &mut target.image_ref, &patch.image_ref);

    if let Some(scorecard) = &patch.scorecard {
        changes.scorecard_changed = apply_scorecard(target, scorecard);
    }

    if changes.main_changed {
        target.last_update = now;
    }
    if changes.scorecard_changed {
        target.scorecard.last_update = now;
    }
    changes
}

fn apply_scorecard(target: &mut StoredEntity, patch: &ScorecardPatch) -> bool {
    let scores = &mut target.scorecard.scores;
    let mut changed = false;
    changed |= assign("active_aggression", &mut scores.active_aggression, &patch.active_aggression);
    changed |= assign("attack_range", &mut scores.attack_range, &patch.attack_range);
    changed |= assign("unpredictability", &mut scores.unpredictability, &patch.unpredictability);
    changed |= assign("special_ability", &mut scores.special_ability, &patch.special_ability);
    changed |= assign("historical_threat", &mut scores.historical_threat, &patch.historical_threat);
    changed |= assign(
        "encounter_probability",
        &mut scores.encounter_probability,
        &patch.encounter_probability,
    );
    changed
}

fn assign<T>(field: &'static str, current: &mut T, incoming: &Option<T>) -> bool
where
    T: PartialEq + Clone + std::fmt::Debug,
{
    match incoming {
        Some(value) if value != current => {
            tracing::debug!(field, old = ?current, new = ?value, "field changed");
            *current = value.clone();
            true
        }
        _ => false,
    }
}
