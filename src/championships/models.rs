use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::AppError;
use crate::users::UserModel;

/// A calendar month in `YYYY-MM` form, the key of the crown history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthLabel {
    year: i32,
    month: u32,
}

impl MonthLabel {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(AppError::Validation(format!(
                "Invalid month {:04}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthLabel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("Month label must be YYYY-MM, got '{}'", s));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        Self::new(year, month)
    }
}

/// Database model for monthly_championships table, unique on month_label
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MonthlyChampionshipRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub month_label: String,
    pub points: i32, // winner's monthly_points when crowned
    pub awarded_at: DateTime<Utc>,
    pub awarded_by: String,
}

impl MonthlyChampionshipRecord {
    pub fn new(winner: &UserModel, month_label: MonthLabel, awarded_by: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: winner.id,
            month_label: month_label.to_string(),
            points: winner.monthly_points,
            awarded_at: Utc::now(),
            awarded_by: awarded_by.to_string(),
        }
    }
}

/// Picks the monthly leader: most monthly points, then the oldest account,
/// then the lowest id. Nobody qualifies without points this month.
pub fn select_monthly_leader<'a, I>(users: I) -> Option<&'a UserModel>
where
    I: IntoIterator<Item = &'a UserModel>,
{
    users
        .into_iter()
        .filter(|user| user.monthly_points > 0)
        .min_by_key(|user| (Reverse(user.monthly_points), user.created_at, user.id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSummary {
    pub users_reset: u64,
}

/// What a rollover run did for the month the counters belonged to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverOutcome {
    pub month_label: String,
    /// Crown awarded by this run, if any
    pub championship: Option<MonthlyChampionshipRecord>,
    /// Users reset by this run; `None` when nothing was reset
    pub users_reset: Option<u64>,
}

impl RolloverOutcome {
    /// A run that found the month still open
    pub fn idle(month_label: String) -> Self {
        Self {
            month_label,
            championship: None,
            users_reset: None,
        }
    }
}
