// Stats aggregation: folding scored predictions into user totals.
//
// The atomic unit (match flip + prediction scores + user counters) is
// executed by the store; this module owns the arithmetic it applies.

pub mod aggregate;
mod handlers;
pub mod models;
pub mod service;
mod types;

pub use aggregate::{current_streak, derive_totals, fold_increments, longest_streak};
pub use handlers::finish_match;
pub use models::{FinishSummary, ScoredPrediction, UserTotals};
pub use service::StatsService;
