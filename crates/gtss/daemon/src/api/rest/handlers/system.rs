//! Liveness and classifier metadata handlers

use axum::Json;
use gtss_store::{TierWeights, WEIGHTS};

/// Liveness echo
pub async fn echo() -> &'static str {
    "if you see this message, the gtss daemon is running."
}

/// Fixed classifier weights, for documentation
pub async fn get_weights() -> Json<TierWeights> {
    Json(WEIGHTS)
}
