// Application state (AppState)

use crate::core::config::Config;
use crate::metrics::collector::Metrics;
use crate::stores::{result_ledger::ResultLedger, user_store::UserStore};
use crate::wal::wal::Wal;
use std::sync::Arc;

/// Shared application state
///
/// Holds every component the handlers and the bearer gate touch.
/// All fields are wrapped in Arc for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Users, logins and session tokens
    pub user_store: Arc<UserStore>,

    /// Per-user check history
    pub ledger: Arc<ResultLedger>,

    /// Runtime metrics for the summary endpoint
    pub metrics: Arc<Metrics>,

    /// Write-Ahead Log shared with both stores
    pub wal: Arc<Wal>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, wal: Wal) -> Self {
        let config = Arc::new(config);
        let wal = Arc::new(wal);

        Self {
            user_store: Arc::new(UserStore::with_capacity(
                config.server.user_capacity,
                Arc::clone(&wal),
            )),
            ledger: Arc::new(ResultLedger::new(Arc::clone(&wal))),
            metrics: Arc::new(Metrics::new()),
            wal,
            config,
        }
    }
}
