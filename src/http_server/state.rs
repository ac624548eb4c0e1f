//! Shared handler state.

use std::sync::Arc;

use crate::observability::Logger;
use crate::store::StoreSession;

/// Dependencies every handler receives
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreSession>,
    pub logger: Logger,
}

impl AppState {
    pub fn new(store: Arc<dyn StoreSession>, logger: Logger) -> Self {
        Self { store, logger }
    }
}
