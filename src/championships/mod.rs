// Public API - what other modules can use
pub use handlers::{award_championship, list_championships, reset_monthly_stats, run_rollover};
pub use models::{
    select_monthly_leader, MonthLabel, MonthlyChampionshipRecord, ResetSummary, RolloverOutcome,
};
pub use rollover_task::{start_rollover_task, RolloverConfig};
pub use service::ChampionshipService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod rollover_task;
pub mod service;
mod types;
