// Public API - what other modules can use
pub use handlers::{get_prediction, list_predictions, submit_prediction};
pub use models::{PredictionModel, PredictionUpsert};
pub use service::PredictionService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
