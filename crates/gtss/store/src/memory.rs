//! In-memory reference implementation of [`EntityStore`].
//!
//! Deterministic and test-friendly. Deployments that need durability should use
//! the SQLite backend.

use crate::diff::{apply_patch, check_new, check_patch};
use crate::model::{
    EntityId, EntityPatch, NewEntity, Page, PageRequest, StoredEntity, StoredScorecard,
};
use crate::traits::{check_page, EntityStore};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::RwLock;

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<StoredEntity>,
}

impl Table {
    fn position(&self, name: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.name == name)
    }
}

/// In-memory entity store. Rows are kept in insertion order.
#[derive(Default)]
pub struct InMemoryEntityStore {
    table: RwLock<Table>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::StorageFailure("entity table lock poisoned".to_string())
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn create(&self, entity: NewEntity) -> StoreResult<StoredEntity> {
        check_new(&entity)?;
        let mut table = self.table.write().map_err(poisoned)?;
        if table.position(&entity.name).is_some() {
            tracing::warn!(name = %entity.name, "rejected duplicate entity");
            return Err(StoreError::duplicate(&entity.name));
        }

        table.next_id += 1;
        let now = Utc::now();
        let stored = StoredEntity {
            id: EntityId(table.next_id),
            name: entity.name,
            category: entity.category,
            affiliation: entity.affiliation,
            notes: entity.notes,
            image_ref: entity.image_ref,
            last_update: now,
            scorecard: StoredScorecard {
                scores: entity.scorecard,
                last_update: now,
            },
        };
        table.rows.push(stored.clone());
        tracing::info!(name = %stored.name, id = %stored.id, "created entity");
        Ok(stored)
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<StoredEntity> {
        let table = self.table.read().map_err(poisoned)?;
        table
            .position(name)
            .map(|idx| table.rows[idx].clone())
            .ok_or_else(|| StoreError::not_found(name))
    }

    async fn get_all(&self) -> StoreResult<Vec<StoredEntity>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.clone())
    }

    async fn list_page(&self, request: PageRequest) -> StoreResult<Page<StoredEntity>> {
        check_page(request)?;
        let table = self.table.read().map_err(poisoned)?;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = table
            .rows
            .iter()
            .skip(offset)
            .take(request.page_size as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, request, table.rows.len() as u64))
    }

    async fn update(&self, name: &str, patch: EntityPatch) -> StoreResult<StoredEntity> {
        check_patch(&patch)?;
        let mut table = self.table.write().map_err(poisoned)?;
        let idx = table.position(name).ok_or_else(|| StoreError::not_found(name))?;

        let mut updated = table.rows[idx].clone();
        let changes = apply_patch(&mut updated, &patch, Utc::now());
        if changes.is_empty() {
            tracing::debug!(name, "update is a no-op");
            return Ok(updated);
        }
        if updated.name != name && table.position(&updated.name).is_some() {
            return Err(StoreError::duplicate(&updated.name));
        }

        table.rows[idx] = updated.clone();
        tracing::info!(
            name,
            main_changed = changes.main_changed,
            scorecard_changed = changes.scorecard_changed,
            "updated entity"
        );
        Ok(updated)
    }

    async fn delete(&self, name: &str) -> StoreResult<bool> {
        let mut table = self.table.write().map_err(poisoned)?;
        match table.position(name) {
            Some(idx) => {
                table.rows.remove(idx);
                tracing::info!(name, "deleted entity");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract;

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        contract::duplicate_create_conflicts(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn identical_patch_is_a_no_op() {
        contract::identical_patch_is_a_no_op(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn scorecard_patch_only_bumps_scorecard() {
        contract::scorecard_patch_only_bumps_scorecard(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn main_patch_only_bumps_entity() {
        contract::main_patch_only_bumps_entity(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn rename_onto_existing_name_conflicts() {
        contract::rename_onto_existing_name_conflicts(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        contract::update_missing_is_not_found(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn delete_semantics() {
        contract::delete_semantics(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn pagination() {
        contract::pagination(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn invalid_page_request() {
        contract::invalid_page_request(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn list_by_tier_matches_filter() {
        contract::list_by_tier_matches_filter(&InMemoryEntityStore::new()).await;
    }

    #[tokio::test]
    async fn malformed_input_is_a_validation_gap() {
        contract::malformed_input_is_a_validation_gap(&InMemoryEntityStore::new()).await;
    }
}
