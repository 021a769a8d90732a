pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod area {
    pub mod predicate;
}

pub mod handlers {
    pub mod area;
    pub mod auth;
    pub mod fallback;
    pub mod health;
    pub mod metrics;
    pub mod results;
}

pub mod metrics {
    pub mod collector;
}

pub mod models {
    pub mod api;
    pub mod hit_result;
    pub mod user;
}

pub mod security {
    pub mod bearer_gate;
    pub mod token;
}

pub mod stores {
    pub mod result_ledger;
    pub mod user_store;
}

pub mod utils {
    pub mod auth;
    pub mod time;
}

pub mod validation {
    pub mod params;
}

pub mod wal {
    #[allow(clippy::module_inception)]
    pub mod wal;
}
