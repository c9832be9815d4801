// Library crate for the GlobalScore scoring service
// This file exposes the public API for the binary and integration tests

pub mod awards;
pub mod championships;
pub mod config;
pub mod leagues;
pub mod matches;
pub mod predictions;
pub mod router;
pub mod scoring;
pub mod shared;
pub mod stats;
pub mod store;
pub mod users;

// Re-export commonly used types for easier access in tests
pub use championships::{ChampionshipService, MonthLabel, RolloverConfig};
pub use config::AppConfig;
pub use router::build_router;
pub use scoring::{ScoreOutcome, ScoringEngine};
pub use shared::{AppError, AppState};
pub use stats::StatsService;
pub use store::{InMemoryStore, PostgresStore};
