//! History filtering.
//!
//! A [`HistoryFilter`] is what the history page's query string
//! deserializes into. Every criterion is optional; an empty filter
//! (apart from the default 30-day period) keeps everything.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer};
use vitalog_protocol::Reading;

/// Display format for reading dates, also matched by free-text search.
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

/// How far back the history reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Period {
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// Length of the window, or `None` for [`Period::All`].
    pub fn window(&self) -> Option<TimeDelta> {
        match self {
            Self::SevenDays => Some(TimeDelta::days(7)),
            Self::ThirtyDays => Some(TimeDelta::days(30)),
            Self::NinetyDays => Some(TimeDelta::days(90)),
            Self::All => None,
        }
    }
}

/// Criteria for narrowing a user's readings.
///
/// Ranges are inclusive. A bound left empty in the query string
/// (`systolicMin=`) counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryFilter {
    pub period: Period,
    #[serde(deserialize_with = "empty_as_none")]
    pub systolic_min: Option<u16>,
    #[serde(deserialize_with = "empty_as_none")]
    pub systolic_max: Option<u16>,
    #[serde(deserialize_with = "empty_as_none")]
    pub diastolic_min: Option<u16>,
    #[serde(deserialize_with = "empty_as_none")]
    pub diastolic_max: Option<u16>,
    #[serde(deserialize_with = "empty_as_none")]
    pub heart_rate_min: Option<u16>,
    #[serde(deserialize_with = "empty_as_none")]
    pub heart_rate_max: Option<u16>,
    /// Matches notes (case-insensitive) or the date as shown on screen.
    pub search: Option<String>,
}

impl HistoryFilter {
    /// Returns `true` if `reading` passes every criterion as of `now`.
    ///
    /// With a bounded period, readings dated after `now` are excluded.
    pub fn matches(&self, reading: &Reading, now: NaiveDateTime) -> bool {
        if let Some(window) = self.period.window() {
            if reading.date < now - window || reading.date > now {
                return false;
            }
        }

        in_range(reading.systolic, self.systolic_min, self.systolic_max)
            && in_range(reading.diastolic, self.diastolic_min, self.diastolic_max)
            && in_range(reading.heart_rate, self.heart_rate_min, self.heart_rate_max)
            && self.matches_search(reading)
    }

    /// Filters `readings` and sorts the survivors newest first.
    pub fn apply(&self, readings: &[Reading], now: NaiveDateTime) -> Vec<Reading> {
        let mut kept: Vec<Reading> = readings
            .iter()
            .filter(|r| self.matches(r, now))
            .cloned()
            .collect();
        kept.sort_by(|a, b| b.date.cmp(&a.date));
        kept
    }

    fn matches_search(&self, reading: &Reading) -> bool {
        let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) else {
            return true;
        };
        reading.notes.to_lowercase().contains(&term.to_lowercase())
            || reading
                .date
                .format(DATE_DISPLAY_FORMAT)
                .to_string()
                .contains(term)
    }
}

fn in_range(value: u16, min: Option<u16>, max: Option<u16>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

/// Deserializes `""` (and absence) as `None`, anything else as a `u16`.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
