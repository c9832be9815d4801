// Public API - what other modules can use
pub use handlers::{create_match, get_match, start_match};
pub use models::{FinishMatchRequest, MatchModel, MatchResult, MatchStatus, TeamSide};
pub use service::MatchService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
