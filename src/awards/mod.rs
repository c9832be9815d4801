// Public API - what other modules can use
pub use handlers::{
    create_award, finish_award, get_award, list_award_predictions, submit_award_prediction,
};
pub use models::{AwardModel, AwardPredictionModel, AwardPredictionUpsert};
pub use service::AwardService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
