//! CSV export of readings.

use vitalog_protocol::Reading;

use crate::BloodPressureCategory;
use crate::filter::DATE_DISPLAY_FORMAT;

const HEADER: [&str; 6] = [
    "Date/Time",
    "Systolic",
    "Diastolic",
    "Heart rate",
    "Category",
    "Notes",
];

/// Renders readings as CSV, one row per reading in the given order.
///
/// Fields containing a comma, a quote or a line break are quoted, with
/// inner quotes doubled (RFC 4180). Rows end with `\n`.
pub fn to_csv(readings: &[Reading]) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|h| h.to_string()));

    for reading in readings {
        let category = BloodPressureCategory::classify(reading.systolic, reading.diastolic);
        push_row(
            &mut out,
            [
                reading.date.format(DATE_DISPLAY_FORMAT).to_string(),
                reading.systolic.to_string(),
                reading.diastolic.to_string(),
                reading.heart_rate.to_string(),
                category.label().to_string(),
                reading.notes.clone(),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(&field));
    }
    out.push('\n');
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
