//! Blood-pressure and heart-rate classification.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BloodPressureCategory
// ---------------------------------------------------------------------------

/// Where a blood-pressure reading falls.
///
/// Thresholds (either value reaching the threshold is enough):
///
/// ```text
/// systolic ≥ 180 or diastolic ≥ 110  → HypertensiveCrisis
/// systolic ≥ 140 or diastolic ≥  90  → Hypertension
/// systolic ≥ 130 or diastolic ≥  80  → Elevated
/// otherwise                          → Normal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BloodPressureCategory {
    Normal,
    Elevated,
    Hypertension,
    HypertensiveCrisis,
}

impl BloodPressureCategory {
    /// Classifies a systolic/diastolic pair.
    pub fn classify(systolic: u16, diastolic: u16) -> Self {
        if systolic >= 180 || diastolic >= 110 {
            Self::HypertensiveCrisis
        } else if systolic >= 140 || diastolic >= 90 {
            Self::Hypertension
        } else if systolic >= 130 || diastolic >= 80 {
            Self::Elevated
        } else {
            Self::Normal
        }
    }

    /// Human-readable label, as used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Elevated => "Elevated",
            Self::Hypertension => "Hypertension",
            Self::HypertensiveCrisis => "Hypertensive crisis",
        }
    }

    /// Returns `true` for the categories that warrant attention.
    pub fn is_high(&self) -> bool {
        matches!(self, Self::Hypertension | Self::HypertensiveCrisis)
    }
}

impl std::fmt::Display for BloodPressureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// HeartRateCategory
// ---------------------------------------------------------------------------

/// Where a resting heart rate (bpm) falls.
///
/// ```text
///   < 50     → Bradycardia
///  50 – 59   → Low
///  60 – 100  → Normal
/// 101 – 120  → Elevated
///  > 120     → Tachycardia
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeartRateCategory {
    Bradycardia,
    Low,
    Normal,
    Elevated,
    Tachycardia,
}

impl HeartRateCategory {
    /// Classifies a heart rate in beats per minute.
    pub fn classify(bpm: u16) -> Self {
        match bpm {
            0..50 => Self::Bradycardia,
            50..60 => Self::Low,
            60..=100 => Self::Normal,
            101..=120 => Self::Elevated,
            _ => Self::Tachycardia,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bradycardia => "Bradycardia",
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::Elevated => "Elevated",
            Self::Tachycardia => "Tachycardia",
        }
    }
}

impl std::fmt::Display for HeartRateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
