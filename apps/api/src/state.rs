use std::sync::Arc;

use crate::screening::ScreeningService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Session registry, Dialogue Engine and session store.
    pub screening: Arc<ScreeningService>,
}
