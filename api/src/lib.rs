pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod lobby;
pub mod routes;
pub mod types;

#[cfg(all(test, not(feature = "postgres")))]
pub(crate) mod test_support;

use config::AppConfig;
use events::EventHub;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: db::Db,
    pub config: AppConfig,
    pub events: EventHub,
}
