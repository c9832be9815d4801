mod knockout_advance;
mod match_result;

pub use knockout_advance::KnockoutAdvanceCalculator;
pub use match_result::MatchResultCalculator;
