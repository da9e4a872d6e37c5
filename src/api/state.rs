use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::adapters::PostgresStore;
use crate::engine::Engine;
use crate::services::quotes::QuoteBoard;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-side store
    pub store: Arc<PostgresStore>,

    /// Transactional wagering engine
    pub engine: Arc<Engine>,

    /// Market quote board shown on the site
    pub quotes: QuoteBoard,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<PostgresStore>, engine: Arc<Engine>, quotes: QuoteBoard) -> Self {
        Self {
            store,
            engine,
            quotes,
            start_time: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
