use crate::model::{EntityPatch, NewEntity, Page, PageRequest, StoredEntity};
use crate::tier::{classify, Tier};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;

/// Storage interface for entities and their scorecards.
///
/// Implementations keep entity and scorecard as a 1:1 pair, enforce name
/// uniqueness, and roll back any partially applied write before returning an
/// error.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert an entity together with its scorecard.
    async fn create(&self, entity: NewEntity) -> StoreResult<StoredEntity>;

    /// Exact, case-sensitive lookup.
    async fn get_by_name(&self, name: &str) -> StoreResult<StoredEntity>;

    /// Every entity, in insertion order. Unbounded.
    async fn get_all(&self) -> StoreResult<Vec<StoredEntity>>;

    /// One page in insertion order plus the total row count.
    async fn list_page(&self, request: PageRequest) -> StoreResult<Page<StoredEntity>>;

    /// Apply the populated slots of `patch`. Writes nothing when no value differs.
    async fn update(&self, name: &str, patch: EntityPatch) -> StoreResult<StoredEntity>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, name: &str) -> StoreResult<bool>;

    /// Entities whose computed tier equals `tier`.
    ///
    /// Linear scan over [`EntityStore::get_all`]; cost grows with the table.
    async fn list_by_tier(&self, tier: Tier) -> StoreResult<Vec<StoredEntity>> {
        let all = self.get_all().await?;
        Ok(all
            .into_iter()
            .filter(|entity| classify(&entity.scorecard.scores) == tier)
            .collect())
    }

    /// Release backend resources. Further calls may fail.
    async fn close(&self) {}
}

pub(crate) fn check_page(request: PageRequest) -> StoreResult<()> {
    if request.page == 0 || request.page_size == 0 {
        return Err(StoreError::ValidationGap(format!(
            "page and page_size must be at least 1 (got page={}, page_size={})",
            request.page, request.page_size
        )));
    }
    Ok(())
}
