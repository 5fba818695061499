//! Shared validation helpers for inbound HTTP adapters.
//!
//! Domain validation errors name the offending field and a stable reason.
//! [`field_error`] turns any of them into the `400` envelope
//! `{"code":"invalid_request","details":{"field":..,"code":..}}`.

use std::fmt::Display;

use serde_json::json;

use crate::domain::{
    DoctorDraftValidationError, Error, LoginValidationError, NotificationSource,
    PatientDraftValidationError, RecordKind, ReportStatus, ReportValidationError,
    SettingsValidationError, SignUpValidationError,
};

/// A validation failure that can be attributed to one payload field.
pub(crate) trait FieldViolation: Display {
    fn field(&self) -> &'static str;
    fn code(&self) -> &'static str;
}

macro_rules! field_violation {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FieldViolation for $ty {
                fn field(&self) -> &'static str {
                    <$ty>::field(self)
                }

                fn code(&self) -> &'static str {
                    <$ty>::code(self)
                }
            }
        )+
    };
}

field_violation!(
    LoginValidationError,
    SignUpValidationError,
    DoctorDraftValidationError,
    PatientDraftValidationError,
    SettingsValidationError,
);

impl FieldViolation for ReportValidationError {
    fn field(&self) -> &'static str {
        ReportValidationError::field(self)
    }

    fn code(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "empty_title",
            Self::EmptyDescription => "empty_description",
        }
    }
}

/// Map a field-level validation failure to an `invalid_request` error.
pub(crate) fn field_error(violation: impl FieldViolation) -> Error {
    Error::invalid_request(violation.to_string()).with_details(json!({
        "field": violation.field(),
        "code": violation.code(),
    }))
}

fn invalid_value(field: &str, value: &str, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "value": value,
        "code": "invalid_value",
    }))
}

/// Parse a record kind from a path segment such as `doctors`.
pub(crate) fn parse_record_kind(raw: &str) -> Result<RecordKind, Error> {
    raw.parse()
        .map_err(|err| invalid_value("kind", raw, format!("{err}")))
}

/// Parse a notification source from a path segment.
pub(crate) fn parse_notification_source(raw: &str) -> Result<NotificationSource, Error> {
    raw.parse()
        .map_err(|err| invalid_value("source", raw, format!("{err}")))
}

/// Parse a report status from a body or query value.
pub(crate) fn parse_report_status(raw: &str) -> Result<ReportStatus, Error> {
    raw.parse()
        .map_err(|err| invalid_value("status", raw, format!("{err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, PasswordChangeError};
    use rstest::rstest;
    use serde_json::Value;

    fn details(error: &Error) -> (&str, &str) {
        let details = error.details().expect("details present");
        (
            details.get("field").and_then(Value::as_str).expect("field"),
            details.get("code").and_then(Value::as_str).expect("code"),
        )
    }

    #[rstest]
    fn sign_up_mismatch_names_password_field() {
        let error = field_error(SignUpValidationError::Password(
            PasswordChangeError::Mismatch,
        ));
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(error.message(), "passwords do not match");
        assert_eq!(details(&error), ("password", "password_mismatch"));
    }

    #[rstest]
    #[case(ReportValidationError::EmptyTitle, ("title", "empty_title"))]
    #[case(ReportValidationError::EmptyDescription, ("reportData", "empty_description"))]
    fn report_violations_carry_codes(
        #[case] violation: ReportValidationError,
        #[case] expected: (&str, &str),
    ) {
        assert_eq!(details(&field_error(violation)), expected);
    }

    #[rstest]
    #[case("doctors", RecordKind::Doctor)]
    #[case("patient", RecordKind::Patient)]
    #[case("reports", RecordKind::Report)]
    fn record_kinds_parse(#[case] raw: &str, #[case] kind: RecordKind) {
        assert_eq!(parse_record_kind(raw).expect("known kind"), kind);
    }

    #[rstest]
    fn unknown_values_echo_input() {
        let error = parse_record_kind("nurses").expect_err("unknown kind");
        let details = error.details().expect("details");
        assert_eq!(details["value"], "nurses");
        assert_eq!(details["code"], "invalid_value");

        assert!(parse_notification_source("email").is_err());
        assert!(parse_report_status("open").is_err());
    }
}
