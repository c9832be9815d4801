//! Point sources that are independent of match scoring: season-long league
//! picks and individual award picks.

use super::{points, ScoreOutcome};
use crate::leagues::{LeaguePredictionModel, LeagueResult};

/// Compares a picked name with the real one, ignoring case and surrounding whitespace.
/// A missing or blank pick never matches.
pub fn names_match(predicted: Option<&str>, actual: &str) -> bool {
    match predicted.map(str::trim) {
        Some(pick) if !pick.is_empty() => pick.to_lowercase() == actual.trim().to_lowercase(),
        _ => false,
    }
}

/// 5 points for each of champion, top scorer, top assist and MVP guessed right
pub fn score_league_prediction(
    prediction: &LeaguePredictionModel,
    result: &LeagueResult,
) -> ScoreOutcome {
    let picks = [
        (prediction.champion.as_deref(), result.champion.as_str()),
        (prediction.top_scorer.as_deref(), result.top_scorer.as_str()),
        (prediction.top_assist.as_deref(), result.top_assist.as_str()),
        (prediction.mvp.as_deref(), result.mvp.as_str()),
    ];

    let hits = picks
        .into_iter()
        .filter(|(pick, actual)| names_match(*pick, actual))
        .count() as i32;

    ScoreOutcome::from_points(hits * points::LEAGUE_CATEGORY)
}

pub fn score_award_prediction(predicted_winner: &str, winner: &str) -> ScoreOutcome {
    if names_match(Some(predicted_winner), winner) {
        ScoreOutcome::new(points::AWARD_WINNER, true)
    } else {
        ScoreOutcome::MISS
    }
}
