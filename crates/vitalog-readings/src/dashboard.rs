//! Dashboard summary: what the last 30 days look like.
//!
//! Everything here is a pure function of a slice of readings and "now",
//! so the server computes it per request and tests pin the clock.

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use vitalog_protocol::Reading;

use crate::{BloodPressureCategory, HeartRateCategory};

/// How far back the dashboard looks.
pub const DASHBOARD_WINDOW_DAYS: i64 = 30;

/// How many of the most recent readings the dashboard lists.
pub const LATEST_COUNT: usize = 5;

/// A heart-rate spread (max − min, bpm) above this is flagged.
const HIGH_VARIABILITY_BPM: u16 = 50;

/// Aggregate numbers over the dashboard window.
///
/// All zero when there are no readings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub avg_systolic: u16,
    pub avg_diastolic: u16,
    pub avg_heart_rate: u16,
    pub max_systolic: u16,
    pub min_systolic: u16,
    pub max_diastolic: u16,
    pub min_diastolic: u16,
    pub max_heart_rate: u16,
    pub min_heart_rate: u16,
    /// Readings whose [`BloodPressureCategory`] is high.
    pub high_readings: usize,
    pub normal_readings: usize,
    pub total_readings: usize,
}

/// How many readings fall into each heart-rate band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateBands {
    pub bradycardia: usize,
    pub low: usize,
    pub normal: usize,
    pub elevated: usize,
    pub tachycardia: usize,
}

impl HeartRateBands {
    fn count(&mut self, category: HeartRateCategory) {
        match category {
            HeartRateCategory::Bradycardia => self.bradycardia += 1,
            HeartRateCategory::Low => self.low += 1,
            HeartRateCategory::Normal => self.normal += 1,
            HeartRateCategory::Elevated => self.elevated += 1,
            HeartRateCategory::Tachycardia => self.tachycardia += 1,
        }
    }
}

/// Something in the window the user should know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HeartRateAlert {
    /// Readings below 50 bpm.
    Bradycardia { count: usize },
    /// Readings above 120 bpm.
    Tachycardia { count: usize },
    /// Max and min heart rate more than 50 bpm apart.
    HighVariability { spread: u16 },
    /// Every reading in the window is within 60–100 bpm.
    AllNormal,
}

/// A reading together with its classifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedReading {
    #[serde(flatten)]
    pub reading: Reading,
    pub blood_pressure_category: BloodPressureCategory,
    pub heart_rate_category: HeartRateCategory,
}

impl From<Reading> for ClassifiedReading {
    fn from(reading: Reading) -> Self {
        Self {
            blood_pressure_category: BloodPressureCategory::classify(
                reading.systolic,
                reading.diastolic,
            ),
            heart_rate_category: HeartRateCategory::classify(reading.heart_rate),
            reading,
        }
    }
}

/// The full dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub latest: Vec<ClassifiedReading>,
    pub heart_rate_bands: HeartRateBands,
    pub alerts: Vec<HeartRateAlert>,
}

impl Dashboard {
    /// Builds the dashboard from a user's readings as of `now`.
    ///
    /// Readings older than [`DASHBOARD_WINDOW_DAYS`] are ignored. The
    /// input order doesn't matter.
    pub fn build(readings: &[Reading], now: NaiveDateTime) -> Self {
        let since = now - TimeDelta::days(DASHBOARD_WINDOW_DAYS);
        let mut recent: Vec<&Reading> = readings.iter().filter(|r| r.date >= since).collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));

        let stats = summarize(&recent);

        let mut heart_rate_bands = HeartRateBands::default();
        for reading in &recent {
            heart_rate_bands.count(HeartRateCategory::classify(reading.heart_rate));
        }

        let alerts = alerts(&stats, &heart_rate_bands);

        let latest = recent
            .iter()
            .take(LATEST_COUNT)
            .map(|r| ClassifiedReading::from((*r).clone()))
            .collect();

        Self {
            stats,
            latest,
            heart_rate_bands,
            alerts,
        }
    }
}

/// Computes [`DashboardStats`] over `readings`.
pub fn summarize(readings: &[&Reading]) -> DashboardStats {
    let total = readings.len();
    if total == 0 {
        return DashboardStats::default();
    }

    let high = readings
        .iter()
        .filter(|r| BloodPressureCategory::classify(r.systolic, r.diastolic).is_high())
        .count();

    let systolic = readings.iter().map(|r| r.systolic);
    let diastolic = readings.iter().map(|r| r.diastolic);
    let heart_rate = readings.iter().map(|r| r.heart_rate);

    DashboardStats {
        avg_systolic: rounded_mean(systolic.clone(), total),
        avg_diastolic: rounded_mean(diastolic.clone(), total),
        avg_heart_rate: rounded_mean(heart_rate.clone(), total),
        max_systolic: systolic.clone().max().unwrap_or(0),
        min_systolic: systolic.min().unwrap_or(0),
        max_diastolic: diastolic.clone().max().unwrap_or(0),
        min_diastolic: diastolic.min().unwrap_or(0),
        max_heart_rate: heart_rate.clone().max().unwrap_or(0),
        min_heart_rate: heart_rate.min().unwrap_or(0),
        high_readings: high,
        normal_readings: total - high,
        total_readings: total,
    }
}

/// Mean rounded half-up to the nearest integer.
fn rounded_mean(values: impl Iterator<Item = u16>, count: usize) -> u16 {
    let sum: u64 = values.map(u64::from).sum();
    let count = count as u64;
    // (2·sum + count) / (2·count) == round(sum / count) for positive values.
    let mean = (2 * sum + count) / (2 * count);
    u16::try_from(mean).unwrap_or(u16::MAX)
}

fn alerts(stats: &DashboardStats, bands: &HeartRateBands) -> Vec<HeartRateAlert> {
    let mut alerts = Vec::new();
    if stats.total_readings == 0 {
        return alerts;
    }

    if bands.bradycardia > 0 {
        alerts.push(HeartRateAlert::Bradycardia {
            count: bands.bradycardia,
        });
    }
    if bands.tachycardia > 0 {
        alerts.push(HeartRateAlert::Tachycardia {
            count: bands.tachycardia,
        });
    }
    let spread = stats.max_heart_rate - stats.min_heart_rate;
    if spread > HIGH_VARIABILITY_BPM {
        alerts.push(HeartRateAlert::HighVariability { spread });
    }
    if bands.normal == stats.total_readings {
        alerts.push(HeartRateAlert::AllNormal);
    }
    alerts
}

// =========================================================================
// Tests
// =========================================================================
