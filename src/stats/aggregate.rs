use std::collections::BTreeMap;
use uuid::Uuid;

use super::models::{ScoredPrediction, UserTotals};
use crate::scoring::ScoreOutcome;
use crate::users::StatsIncrement;

/// Sums scored predictions into one increment per user.
///
/// Keyed by a `BTreeMap` so stores update users in ascending id order, which
/// keeps row locks acquired in the same order across concurrent finishes.
pub fn fold_increments<'a, I>(scored: I) -> BTreeMap<Uuid, StatsIncrement>
where
    I: IntoIterator<Item = &'a ScoredPrediction>,
{
    let mut per_user: BTreeMap<Uuid, StatsIncrement> = BTreeMap::new();
    for prediction in scored {
        *per_user.entry(prediction.user_id).or_default() +=
            StatsIncrement::for_outcome(prediction.outcome);
    }
    per_user
}

/// Consecutive correct predictions counting back from the most recent one
pub fn current_streak<I>(newest_first: I) -> i32
where
    I: IntoIterator<Item = bool>,
{
    newest_first.into_iter().take_while(|correct| *correct).count() as i32
}

/// Longest run of consecutive correct predictions anywhere in the history
pub fn longest_streak<I>(history: I) -> i32
where
    I: IntoIterator<Item = bool>,
{
    let (longest, _) = history
        .into_iter()
        .fold((0, 0), |(longest, run), correct| {
            let run = if correct { run + 1 } else { 0 };
            (longest.max(run), run)
        });
    longest
}

/// Rebuilds cumulative totals from scored predictions.
///
/// `match_history` must be ordered newest first; it drives the streaks.
/// `other_outcomes` are league and award predictions, which count towards
/// points and prediction counters but not towards streaks.
pub fn derive_totals(match_history: &[ScoreOutcome], other_outcomes: &[ScoreOutcome]) -> UserTotals {
    let all = match_history.iter().chain(other_outcomes.iter());

    let (points, predictions, correct) = all.fold((0, 0, 0), |(points, count, correct), o| {
        (points + o.points, count + 1, correct + i32::from(o.correct))
    });

    let streak_flags = || match_history.iter().map(|o| o.correct);

    UserTotals {
        points,
        predictions,
        correct,
        current_streak: current_streak(streak_flags()),
        best_streak: longest_streak(streak_flags()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(user_id: Uuid, points: i32) -> ScoredPrediction {
        ScoredPrediction {
            prediction_id: Uuid::new_v4(),
            user_id,
            outcome: ScoreOutcome::from_points(points),
        }
    }

    #[test]
    fn streak_stops_at_first_miss() {
        // newest first: correct, correct, wrong, correct
        assert_eq!(current_streak([true, true, false, true]), 2);
        assert_eq!(current_streak([false, true, true]), 0);
        assert_eq!(current_streak(Vec::<bool>::new()), 0);
    }

    #[test]
    fn longest_streak_scans_whole_history() {
        assert_eq!(longest_streak([true, false, true, true, true, false]), 3);
        assert_eq!(longest_streak([false, false]), 0);
    }

    #[test]
    fn folds_one_increment_per_user() {
        let ana = Uuid::new_v4();
        let beto = Uuid::new_v4();
        let batch = vec![scored(ana, 5), scored(beto, 0), scored(ana, 3)];

        let increments = fold_increments(&batch);

        assert_eq!(increments.len(), 2);
        let ana_increment = increments[&ana];
        assert_eq!(ana_increment.points, 8);
        assert_eq!(ana_increment.predictions, 2);
        assert_eq!(ana_increment.correct, 2);
        assert_eq!(ana_increment.monthly_points, 8);

        let beto_increment = increments[&beto];
        assert_eq!(beto_increment.points, 0);
        assert_eq!(beto_increment.predictions, 1);
        assert_eq!(beto_increment.correct, 0);
    }

    #[test]
    fn empty_batch_updates_nobody() {
        assert!(fold_increments(&Vec::<ScoredPrediction>::new()).is_empty());
    }

    #[test]
    fn derives_totals_from_history() {
        let history = [
            ScoreOutcome::new(5, true),
            ScoreOutcome::new(3, true),
            ScoreOutcome::MISS,
            ScoreOutcome::new(3, true),
            ScoreOutcome::new(3, true),
            ScoreOutcome::new(3, true),
        ];
        let others = [ScoreOutcome::new(10, true), ScoreOutcome::MISS];

        let totals = derive_totals(&history, &others);

        assert_eq!(totals.points, 27);
        assert_eq!(totals.predictions, 8);
        assert_eq!(totals.correct, 6);
        assert_eq!(totals.current_streak, 2);
        assert_eq!(totals.best_streak, 3);
    }
}
