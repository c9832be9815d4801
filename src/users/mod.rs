// Public API - what other modules can use
pub use handlers::{create_user, get_user, leaderboard, reconcile_user};
pub use models::{StatsIncrement, UserModel};
pub use service::UserService;
pub use types::{LeaderboardEntry, LeaderboardScope};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
