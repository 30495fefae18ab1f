use std::sync::Arc;

use crate::db::store::JobStore;
use crate::services::{queue::JobQueue, storage::DocumentStorage};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub queue: Arc<dyn JobQueue>,
    pub storage: Arc<DocumentStorage>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        storage: DocumentStorage,
    ) -> Self {
        Self {
            store,
            queue,
            storage: Arc::new(storage),
        }
    }
}
