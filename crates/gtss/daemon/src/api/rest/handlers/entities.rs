//! Entity management handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use gtss_store::{
    ClassifiedEntity, EntityPatch, NewEntity, Page, PageRequest, StoreError, StoredEntity, Tier,
};
use serde::{Deserialize, Serialize};

const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

/// Paging query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// Delete response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Create a new entity with its scorecard
pub async fn create_entity(
    State(state): State<AppState>,
    Json(request): Json<NewEntity>,
) -> ApiResult<(StatusCode, Json<StoredEntity>)> {
    validate_name(&request.name)?;
    validate_scores(request.scorecard.dimensions())?;

    let stored = state.store.create(request).await?;
    tracing::info!(name = %stored.name, "Created entity");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// List entities one page at a time
pub async fn list_entities(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<StoredEntity>>> {
    if query.page < 1 {
        return Err(ApiError::Validation("page must be at least 1".to_string()));
    }
    if query.page_size < 1 || query.page_size > state.max_page_size {
        return Err(ApiError::Validation(format!(
            "page_size must be between 1 and {}",
            state.max_page_size
        )));
    }

    let page = state
        .store
        .list_page(PageRequest::new(query.page, query.page_size))
        .await?;
    Ok(Json(page))
}

/// Get one entity with its computed tier
pub async fn get_entity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ClassifiedEntity>> {
    let entity = state.store.get_by_name(&name).await?;
    Ok(Json(entity.into()))
}

/// Apply a partial update
pub async fn update_entity(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(patch): Json<EntityPatch>,
) -> ApiResult<Json<ClassifiedEntity>> {
    if let Some(new_name) = &patch.name {
        validate_name(new_name)?;
    }
    if let Some(scorecard) = &patch.scorecard {
        validate_scores(scorecard.populated())?;
    }

    let entity = state.store.update(&name, patch).await?;
    Ok(Json(entity.into()))
}

/// Delete an entity and its scorecard
pub async fn delete_entity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.store.delete(&name).await? {
        return Err(StoreError::not_found(&name).into());
    }
    tracing::info!(name = %name, "Deleted entity");
    Ok(Json(DeleteResponse { deleted: true }))
}

/// List entities whose computed tier matches
pub async fn list_entities_by_tier(
    State(state): State<AppState>,
    Path(tier): Path<String>,
) -> ApiResult<Json<Vec<ClassifiedEntity>>> {
    let tier: Tier = tier.parse().map_err(|_| {
        ApiError::BadRequest(format!("invalid tier `{tier}`, expected S/A/B/C/D"))
    })?;

    let entities = state.store.list_by_tier(tier).await?;
    Ok(Json(entities.into_iter().map(Into::into).collect()))
}

fn validate_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_scores(scores: impl IntoIterator<Item = (&'static str, f64)>) -> ApiResult<()> {
    for (field, value) in scores {
        if !SCORE_RANGE.contains(&value) {
            return Err(ApiError::Validation(format!(
                "{field} must be within [0, 10], got {value}"
            )));
        }
    }
    Ok(())
}
