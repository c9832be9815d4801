// Public API - what other modules can use
pub use handlers::{
    create_league, finish_league, get_league, list_league_predictions, submit_league_prediction,
};
pub use models::{LeagueModel, LeaguePredictionModel, LeaguePredictionUpsert, LeagueResult};
pub use service::LeagueService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
