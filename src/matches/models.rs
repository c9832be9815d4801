use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Live,
    Finished,
}

/// Which side of a match: used for the team that advances in knockouts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TeamSide {
    Home,
    Away,
}

/// Database model for matches table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchModel {
    pub id: Uuid,
    pub home_team: String,
    pub away_team: String,
    pub deadline: DateTime<Utc>, // predictions lock after this instant
    pub status: MatchStatus,
    pub is_knockout: bool,
    pub result_home: Option<i32>,
    pub result_away: Option<i32>,
    pub advancing_team: Option<TeamSide>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MatchModel {
    /// Creates a pending match with a generated ID
    pub fn new(
        home_team: String,
        away_team: String,
        deadline: DateTime<Utc>,
        is_knockout: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            home_team,
            away_team,
            deadline,
            status: MatchStatus::Pending,
            is_knockout,
            result_home: None,
            result_away: None,
            advancing_team: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// Predictions can be created or overwritten only while pending and not past the deadline
    pub fn accepts_predictions_at(&self, now: DateTime<Utc>) -> bool {
        self.status == MatchStatus::Pending && now <= self.deadline
    }

    pub fn result(&self) -> Option<MatchResult> {
        match (self.status, self.result_home, self.result_away) {
            (MatchStatus::Finished, Some(home), Some(away)) => Some(MatchResult {
                home,
                away,
                advancing_team: self.advancing_team,
            }),
            _ => None,
        }
    }

    /// Marks the match finished with its real result
    pub fn finish(&mut self, result: &MatchResult, finished_at: DateTime<Utc>) {
        self.status = MatchStatus::Finished;
        self.result_home = Some(result.home);
        self.result_away = Some(result.away);
        self.advancing_team = result.advancing_team;
        self.finished_at = Some(finished_at);
    }
}

/// The real score of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub home: i32,
    pub away: i32,
    pub advancing_team: Option<TeamSide>,
}

/// Everything a store needs to finish a match in one atomic step
#[derive(Debug, Clone)]
pub struct FinishMatchRequest {
    pub match_id: Uuid,
    pub result: MatchResult,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_match_is_pending_without_result() {
        let fixture = MatchModel::new(
            "A".into(),
            "B".into(),
            Utc::now() + Duration::hours(2),
            false,
        );
        assert_eq!(fixture.status, MatchStatus::Pending);
        assert!(fixture.result().is_none());
        assert!(fixture.accepts_predictions_at(Utc::now()));
    }

    #[test]
    fn deadline_instant_still_accepts_predictions() {
        let deadline = Utc::now();
        let fixture = MatchModel::new("A".into(), "B".into(), deadline, false);

        assert!(fixture.accepts_predictions_at(deadline));
        assert!(!fixture.accepts_predictions_at(deadline + Duration::seconds(1)));
    }

    #[test]
    fn finishing_exposes_result() {
        let mut fixture = MatchModel::new("A".into(), "B".into(), Utc::now(), true);
        let result = MatchResult {
            home: 1,
            away: 1,
            advancing_team: Some(TeamSide::Away),
        };

        fixture.finish(&result, Utc::now());

        assert!(fixture.is_finished());
        assert_eq!(fixture.result(), Some(result));
        assert!(!fixture.accepts_predictions_at(Utc::now() - Duration::days(1)));
    }

    #[test]
    fn statuses_round_trip_as_lowercase_text() {
        assert_eq!(MatchStatus::Finished.to_string(), "finished");
        assert_eq!("live".parse::<MatchStatus>().unwrap(), MatchStatus::Live);
        assert_eq!("away".parse::<TeamSide>().unwrap(), TeamSide::Away);
    }
}
