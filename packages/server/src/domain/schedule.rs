//! Typed weekly opening-hours schedule.
//!
//! Hours are parsed once at data-entry time into `WeeklyHours` instead of
//! being re-parsed from free text on every availability check. The serialized
//! form stays wire-compatible with the stored shape: a map from lowercase
//! weekday names to either `"H:MM AM - H:MM PM"` text or the literal
//! `"closed"`, with unspecified days omitted.

use std::fmt;

use chrono::Weekday;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Error produced when an hours string does not match the expected shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidHours(pub String);

impl fmt::Display for InvalidHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid opening hours: {}", self.0)
    }
}

impl std::error::Error for InvalidHours {}

/// A clock time with minute precision, stored as minutes since midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MINUTES_PER_DAY: u16 = 24 * 60;

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < Self::MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Parse a 12-hour clock time such as `"7:00 AM"` or `"12:30 pm"`.
    pub fn parse(text: &str) -> Result<Self, InvalidHours> {
        let err = || InvalidHours(format!("expected \"H:MM AM|PM\", got \"{text}\""));

        let (clock, period) = text.trim().split_once(' ').ok_or_else(err)?;
        let (hour, minute) = clock.split_once(':').ok_or_else(err)?;
        let hour: u16 = hour.parse().map_err(|_| err())?;
        let minute: u16 = minute.parse().map_err(|_| err())?;

        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(err());
        }

        // 12-hour to 24-hour normalization: 12 AM is midnight, 12 PM is noon.
        let hour = match period.trim() {
            p if p.eq_ignore_ascii_case("am") => {
                if hour == 12 { 0 } else { hour }
            }
            p if p.eq_ignore_ascii_case("pm") => {
                if hour == 12 { 12 } else { hour + 12 }
            }
            _ => return Err(err()),
        };

        Ok(Self(hour * 60 + minute))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour24, minute) = (self.0 / 60, self.0 % 60);
        let period = if hour24 < 12 { "AM" } else { "PM" };
        let hour = match hour24 % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{hour}:{minute:02} {period}")
    }
}

/// Opening hours for a single day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DaySchedule {
    Closed,
    Open { start: TimeOfDay, end: TimeOfDay },
}

impl DaySchedule {
    /// Parse a day's hours text: the literal `"closed"` (any case) or a
    /// `"<start> - <end>"` range of 12-hour clock times.
    ///
    /// Overnight ranges parse successfully but are rejected by request
    /// validation; see [`DaySchedule::is_overnight`].
    pub fn parse(text: &str) -> Result<Self, InvalidHours> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("closed") {
            return Ok(Self::Closed);
        }
        let (start, end) = text
            .split_once(" - ")
            .ok_or_else(|| InvalidHours(format!("expected \"<start> - <end>\", got \"{text}\"")))?;
        Ok(Self::Open {
            start: TimeOfDay::parse(start)?,
            end: TimeOfDay::parse(end)?,
        })
    }

    /// True for ranges whose end does not lie strictly after their start.
    ///
    /// Such ranges would span midnight; the evaluator treats them as closed
    /// for the after-midnight portion, so data entry refuses them outright.
    pub fn is_overnight(&self) -> bool {
        match self {
            Self::Closed => false,
            Self::Open { start, end } => end <= start,
        }
    }

    fn to_wire(&self) -> String {
        match self {
            Self::Closed => "closed".to_string(),
            open => open.to_string(),
        }
    }
}

impl fmt::Display for DaySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("Closed"),
            Self::Open { start, end } => write!(f, "{start} - {end}"),
        }
    }
}

/// Per-weekday opening hours. `None` means the day was never specified,
/// which is distinct from an explicit `Closed`.
#[derive(Clone, Debug, Default, PartialEq, Eq, FromJsonQueryResult)]
pub struct WeeklyHours {
    pub monday: Option<DaySchedule>,
    pub tuesday: Option<DaySchedule>,
    pub wednesday: Option<DaySchedule>,
    pub thursday: Option<DaySchedule>,
    pub friday: Option<DaySchedule>,
    pub saturday: Option<DaySchedule>,
    pub sunday: Option<DaySchedule>,
}

impl WeeklyHours {
    pub fn for_day(&self, day: Weekday) -> Option<&DaySchedule> {
        match day {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    /// Iterate the specified days, for validation.
    pub fn days(&self) -> impl Iterator<Item = (&'static str, &DaySchedule)> {
        [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ]
        .into_iter()
        .filter_map(|(name, day)| day.as_ref().map(|d| (name, d)))
    }
}

/// Wire representation: raw per-day hours text.
#[derive(Serialize, Deserialize, Default)]
struct RawWeek {
    #[serde(skip_serializing_if = "Option::is_none")]
    monday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tuesday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wednesday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thursday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    friday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saturday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sunday: Option<String>,
}

impl Serialize for WeeklyHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawWeek {
            monday: self.monday.as_ref().map(DaySchedule::to_wire),
            tuesday: self.tuesday.as_ref().map(DaySchedule::to_wire),
            wednesday: self.wednesday.as_ref().map(DaySchedule::to_wire),
            thursday: self.thursday.as_ref().map(DaySchedule::to_wire),
            friday: self.friday.as_ref().map(DaySchedule::to_wire),
            saturday: self.saturday.as_ref().map(DaySchedule::to_wire),
            sunday: self.sunday.as_ref().map(DaySchedule::to_wire),
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WeeklyHours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        fn day<E: de::Error>(
            name: &str,
            text: Option<String>,
        ) -> Result<Option<DaySchedule>, E> {
            text.map(|t| DaySchedule::parse(&t))
                .transpose()
                .map_err(|e| E::custom(format!("{name}: {e}")))
        }

        let raw = RawWeek::deserialize(deserializer)?;
        Ok(Self {
            monday: day("monday", raw.monday)?,
            tuesday: day("tuesday", raw.tuesday)?,
            wednesday: day("wednesday", raw.wednesday)?,
            thursday: day("thursday", raw.thursday)?,
            friday: day("friday", raw.friday)?,
            saturday: day("saturday", raw.saturday)?,
            sunday: day("sunday", raw.sunday)?,
        })
    }
}
