//! Open/closed evaluation against a weekly schedule.
//!
//! Pure functions of a schedule and an explicit instant; the caller supplies
//! "now" so nothing here ever reads the ambient clock.

use chrono::{Datelike, NaiveDateTime, Timelike};

use super::schedule::{DaySchedule, WeeklyHours};

/// Fallback display text when a cafe has no schedule at all.
pub const HOURS_UNAVAILABLE: &str = "Hours not available";

/// Tri-state open/closed answer. `Unknown` means no badge should be shown,
/// which is distinct from a definite `Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenStatus {
    Open,
    Closed,
    Unknown,
}

impl OpenStatus {
    /// `Some(true)`/`Some(false)` for a definite answer, `None` for unknown.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Open => Some(true),
            Self::Closed => Some(false),
            Self::Unknown => None,
        }
    }
}

/// Whether a venue is open at the wall-clock instant `now`.
///
/// Both bounds are inclusive: a cafe is still open at its exact closing
/// minute. An overnight range stored by a legacy writer never matches after
/// midnight and therefore evaluates to `Closed`; data entry rejects such
/// ranges (see [`DaySchedule::is_overnight`]).
pub fn open_status(hours: Option<&WeeklyHours>, now: NaiveDateTime) -> OpenStatus {
    let Some(week) = hours else {
        return OpenStatus::Unknown;
    };

    match week.for_day(now.weekday()) {
        None | Some(DaySchedule::Closed) => OpenStatus::Closed,
        Some(DaySchedule::Open { start, end }) => {
            let current = (now.hour() * 60 + now.minute()) as u16;
            if start.minutes() <= current && current <= end.minutes() {
                OpenStatus::Open
            } else {
                OpenStatus::Closed
            }
        }
    }
}

/// Display text for today's hours: the day's range, `"Closed"`, or the
/// fixed fallback when no schedule exists. Never fails.
pub fn today_hours(hours: Option<&WeeklyHours>, now: NaiveDateTime) -> String {
    match hours {
        None => HOURS_UNAVAILABLE.to_string(),
        Some(week) => week
            .for_day(now.weekday())
            .map(|day| day.to_string())
            .unwrap_or_else(|| "Closed".to_string()),
    }
}
