//! Application state for API handlers

use gtss_store::EntityStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Entity store handle, opened once at startup
    pub store: Arc<dyn EntityStore>,

    /// Upper bound accepted for `page_size`
    pub max_page_size: u32,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn EntityStore>, max_page_size: u32) -> Self {
        Self {
            store,
            max_page_size,
        }
    }
}
