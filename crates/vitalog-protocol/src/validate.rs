//! Request validation.
//!
//! Deserialization only proves a body has the right *shape*. Validation
//! proves the values make sense: a name isn't blank, a systolic pressure
//! is a positive number, a date is a real calendar date.
//!
//! Failures are collected per field rather than stopping at the first
//! one, so a form can highlight every bad input at once:
//!
//! ```text
//! {"formErrors": [], "fieldErrors": {"email": ["required"], "password": ["required"]}}
//! ```

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Measurement, ProtocolError, ReadingInput, SigninRequest, SignupRequest};

/// Upper bounds for plausible measurements. Anything above is a typo.
const MAX_SYSTOLIC: u16 = 300;
const MAX_DIASTOLIC: u16 = 250;
const MAX_HEART_RATE: u16 = 300;

/// Maximum accepted length for free-text notes.
const MAX_NOTES_LEN: usize = 1_000;

// ---------------------------------------------------------------------------
// ValidationDetails
// ---------------------------------------------------------------------------

/// Field-level description of everything wrong with a payload.
///
/// `BTreeMap` (not `HashMap`) keeps the field order stable, so the JSON a
/// client sees is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    /// Problems that aren't tied to a single field.
    pub form_errors: Vec<String>,
    /// Problems keyed by the (wire) field name.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationDetails {
    /// Records a problem with one field.
    pub fn field(&mut self, name: &str, message: impl Into<String>) {
        self.field_errors
            .entry(name.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records a problem with the payload as a whole.
    pub fn form(&mut self, message: impl Into<String>) {
        self.form_errors.push(message.into());
    }

    /// Returns `true` if no problem was recorded.
    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }

    /// `Ok(value)` if nothing was recorded, otherwise
    /// [`ProtocolError::Invalid`].
    fn finish<T>(self, value: T) -> Result<T, ProtocolError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ProtocolError::Invalid(self))
        }
    }
}

// ---------------------------------------------------------------------------
// Validate trait
// ---------------------------------------------------------------------------

/// A request body that can check itself.
///
/// `Output` is the validated form. For sign-up and sign-in it is the
/// request itself; for readings it is a [`ReadingDraft`] with parsed
/// numbers and a real date-time, so downstream code never re-parses.
pub trait Validate {
    type Output;

    /// Checks every rule and returns the validated value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Invalid`] listing every broken rule.
    fn validate(self) -> Result<Self::Output, ProtocolError>;
}

impl Validate for SignupRequest {
    type Output = SignupRequest;

    fn validate(self) -> Result<Self::Output, ProtocolError> {
        let mut details = ValidationDetails::default();

        if self.name.trim().is_empty() {
            details.field("name", "required");
        }
        check_email(&self.email, &mut details);
        if self.password.is_empty() {
            details.field("password", "required");
        }
        if let Some(cep) = &self.cep {
            if cep.trim().is_empty() {
                details.field("cep", "must not be empty when provided");
            }
        }

        details.finish(self)
    }
}

impl Validate for SigninRequest {
    type Output = SigninRequest;

    fn validate(self) -> Result<Self::Output, ProtocolError> {
        let mut details = ValidationDetails::default();

        check_email(&self.email, &mut details);
        if self.password.is_empty() {
            details.field("password", "required");
        }

        details.finish(self)
    }
}

fn check_email(email: &str, details: &mut ValidationDetails) {
    let email = email.trim();
    if email.is_empty() {
        details.field("email", "required");
    } else if !email.contains('@') {
        details.field("email", "must be an email address");
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// A validated reading, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingDraft {
    pub date: NaiveDateTime,
    pub systolic: u16,
    pub diastolic: u16,
    pub heart_rate: u16,
    pub notes: String,
}

impl Validate for ReadingInput {
    type Output = ReadingDraft;

    fn validate(self) -> Result<Self::Output, ProtocolError> {
        let mut details = ValidationDetails::default();

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| details.field("date", "must be a date (YYYY-MM-DD)"))
            .ok();
        let time = parse_time(self.time.trim())
            .ok_or_else(|| details.field("time", "must be a time (HH:MM)"))
            .ok();

        let systolic = measurement("systolic", self.systolic.as_ref(), MAX_SYSTOLIC, &mut details);
        let diastolic =
            measurement("diastolic", self.diastolic.as_ref(), MAX_DIASTOLIC, &mut details);
        let heart_rate =
            measurement("heartRate", self.heart_rate.as_ref(), MAX_HEART_RATE, &mut details);

        let notes = self.notes.unwrap_or_default();
        if notes.chars().count() > MAX_NOTES_LEN {
            details.field("notes", format!("must be at most {MAX_NOTES_LEN} characters"));
        }

        // Every `Option` below is `Some` when `details` is empty: each
        // `None` recorded a field error on the way.
        match (date, time, systolic, diastolic, heart_rate) {
            (Some(date), Some(time), Some(systolic), Some(diastolic), Some(heart_rate))
                if details.is_empty() =>
            {
                Ok(ReadingDraft {
                    date: date.and_time(time),
                    systolic,
                    diastolic,
                    heart_rate,
                    notes,
                })
            }
            _ => Err(ProtocolError::Invalid(details)),
        }
    }
}

/// Accepts `HH:MM` (what a time input sends) and `HH:MM:SS`.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Parses one measurement, recording a field error if it's missing,
/// non-numeric, or outside `1..=max`.
fn measurement(
    field: &str,
    raw: Option<&Measurement>,
    max: u16,
    details: &mut ValidationDetails,
) -> Option<u16> {
    let value = match raw {
        None => None,
        Some(Measurement::Number(n)) => Some(*n),
        Some(Measurement::Text(s)) if s.trim().is_empty() => None,
        Some(Measurement::Text(s)) => match s.trim().parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                details.field(field, "must be a whole number");
                return None;
            }
        },
    };

    let Some(value) = value else {
        details.field(field, "required");
        return None;
    };

    if value < 1 || value > i64::from(max) {
        details.field(field, format!("must be between 1 and {max}"));
        return None;
    }

    u16::try_from(value).ok()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            cep: None,
        }
    }

    fn reading_input() -> ReadingInput {
        ReadingInput {
            date: "2025-03-01".into(),
            time: "08:30".into(),
            systolic: Some(Measurement::Text("120".into())),
            diastolic: Some(Measurement::Number(80)),
            heart_rate: Some(Measurement::Number(72)),
            notes: Some("after coffee".into()),
        }
    }

    fn field_errors(err: ProtocolError) -> BTreeMap<String, Vec<String>> {
        match err {
            ProtocolError::Invalid(details) => details.field_errors,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    // =====================================================================
    // SignupRequest
    // =====================================================================

    #[test]
    fn test_signup_validate_valid_payload_passes() {
        let req = signup("Ana", "ANA@X.com", "Secret123");

        let validated = req.clone().validate().expect("should pass");

        // Validation does not normalize; that's the lifecycle's job.
        assert_eq!(validated, req);
    }

    #[test]
    fn test_signup_validate_reports_every_bad_field() {
        let errors = field_errors(signup(" ", "", "").validate().unwrap_err());

        assert_eq!(
            errors.keys().cloned().collect::<Vec<_>>(),
            vec!["email", "name", "password"]
        );
    }

    #[test]
    fn test_signup_validate_email_without_at_sign_rejected() {
        let errors = field_errors(signup("Ana", "ana.x.com", "pw").validate().unwrap_err());

        assert_eq!(errors["email"], vec!["must be an email address"]);
    }

    #[test]
    fn test_signup_validate_blank_cep_rejected() {
        let mut req = signup("Ana", "ana@x.com", "pw");
        req.cep = Some("".into());

        let errors = field_errors(req.validate().unwrap_err());

        assert!(errors.contains_key("cep"));
    }

    // =====================================================================
    // SigninRequest
    // =====================================================================

    #[test]
    fn test_signin_validate_missing_password_rejected() {
        let req = SigninRequest {
            email: "ana@x.com".into(),
            password: String::new(),
        };

        let errors = field_errors(req.validate().unwrap_err());

        assert_eq!(errors["password"], vec!["required"]);
    }

    // =====================================================================
    // ReadingInput
    // =====================================================================

    #[test]
    fn test_reading_validate_builds_draft() {
        let draft = reading_input().validate().expect("should pass");

        assert_eq!(draft.date.to_string(), "2025-03-01 08:30:00");
        assert_eq!(draft.systolic, 120);
        assert_eq!(draft.diastolic, 80);
        assert_eq!(draft.heart_rate, 72);
        assert_eq!(draft.notes, "after coffee");
    }

    #[test]
    fn test_reading_validate_empty_string_is_required() {
        let mut input = reading_input();
        input.systolic = Some(Measurement::Text(String::new()));

        let errors = field_errors(input.validate().unwrap_err());

        assert_eq!(errors["systolic"], vec!["required"]);
    }

    #[test]
    fn test_reading_validate_non_numeric_rejected() {
        let mut input = reading_input();
        input.heart_rate = Some(Measurement::Text("fast".into()));

        let errors = field_errors(input.validate().unwrap_err());

        assert_eq!(errors["heartRate"], vec!["must be a whole number"]);
    }

    #[test]
    fn test_reading_validate_out_of_range_rejected() {
        let mut input = reading_input();
        input.diastolic = Some(Measurement::Number(0));
        input.systolic = Some(Measurement::Number(400));

        let errors = field_errors(input.validate().unwrap_err());

        assert!(errors.contains_key("diastolic"));
        assert!(errors.contains_key("systolic"));
    }

    #[test]
    fn test_reading_validate_bad_date_and_time_rejected() {
        let mut input = reading_input();
        input.date = "2025-02-30".into();
        input.time = "25:00".into();

        let errors = field_errors(input.validate().unwrap_err());

        assert!(errors.contains_key("date"));
        assert!(errors.contains_key("time"));
    }

    #[test]
    fn test_reading_validate_missing_notes_becomes_empty() {
        let mut input = reading_input();
        input.notes = None;

        let draft = input.validate().unwrap();

        assert_eq!(draft.notes, "");
    }

    #[test]
    fn test_reading_validate_accepts_seconds_in_time() {
        let mut input = reading_input();
        input.time = "08:30:15".into();

        let draft = input.validate().unwrap();

        assert_eq!(draft.date.to_string(), "2025-03-01 08:30:15");
    }
}
