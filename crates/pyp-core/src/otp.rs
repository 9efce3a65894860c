//! One-time passcode policy for signup and password reset.
//!
//! Codes are six digits, stored only as a hash, live for ten minutes and
//! tolerate [`MAX_ATTEMPTS`] wrong guesses. Hashing is done by the caller so
//! this module stays free of crypto dependencies.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const OTP_TTL_MINUTES: i64 = 10;
pub const MAX_ATTEMPTS: i32 = 5;

#[must_use]
pub fn otp_ttl() -> Duration {
    Duration::minutes(OTP_TTL_MINUTES)
}

/// A random code in `100000..=999999`.
#[must_use]
pub fn generate_otp() -> String {
    rand::rng().random_range(100_000..1_000_000u32).to_string()
}

/// Why an OTP is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtpPurpose {
    Signup,
    ForgotPassword,
}

impl OtpPurpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::ForgotPassword => "forgot-password",
        }
    }

    #[must_use]
    pub fn email_subject(self) -> &'static str {
        match self {
            Self::Signup => "Welcome - OTP Verification",
            Self::ForgotPassword => "Reset Password - OTP Verification",
        }
    }
}

impl FromStr for OtpPurpose {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(Self::Signup),
            "forgot-password" => Ok(Self::ForgotPassword),
            other => Err(CoreError::InvalidOtpPurpose(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub id: i64,
    pub email: String,
    pub otp_hash: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= otp_ttl()
    }
}

/// Outcome of checking a submitted code against the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerdict {
    /// No live record for the email.
    Expired,
    /// Attempt cap reached; the record must be deleted.
    TooManyAttempts,
    /// Wrong code; the attempt counter must be incremented.
    Invalid,
    Valid,
}

impl OtpVerdict {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Expired => "OTP expired or invalid",
            Self::TooManyAttempts => "Too many failed attempts. Request a new OTP.",
            Self::Invalid => "Invalid OTP",
            Self::Valid => "OTP verified",
        }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Decide the verdict for `record`.
///
/// The attempt cap is checked before the code, so a record at the cap is
/// rejected even when the submitted code is right. `code_matches` is only
/// called for a live record under the cap.
pub fn evaluate(
    record: Option<&OtpRecord>,
    now: DateTime<Utc>,
    code_matches: impl FnOnce(&str) -> bool,
) -> OtpVerdict {
    let Some(record) = record.filter(|r| !r.is_expired(now)) else {
        return OtpVerdict::Expired;
    };
    if record.attempts >= MAX_ATTEMPTS {
        return OtpVerdict::TooManyAttempts;
    }
    if code_matches(&record.otp_hash) {
        OtpVerdict::Valid
    } else {
        OtpVerdict::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(attempts: i32, age_minutes: i64, now: DateTime<Utc>) -> OtpRecord {
        OtpRecord {
            id: 1,
            email: "a@example.com".to_string(),
            otp_hash: "hash-of-123456".to_string(),
            attempts,
            created_at: now - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }

    #[test]
    fn missing_record_is_expired() {
        let verdict = evaluate(None, Utc::now(), |_| true);
        assert_eq!(verdict, OtpVerdict::Expired);
        assert_eq!(verdict.message(), "OTP expired or invalid");
    }

    #[test]
    fn old_record_is_expired() {
        let now = Utc::now();
        let r = record(0, 11, now);
        assert_eq!(evaluate(Some(&r), now, |_| true), OtpVerdict::Expired);
    }

    #[test]
    fn attempt_cap_wins_over_correct_code() {
        let now = Utc::now();
        let r = record(MAX_ATTEMPTS, 1, now);
        let verdict = evaluate(Some(&r), now, |_| true);
        assert_eq!(verdict, OtpVerdict::TooManyAttempts);
        assert!(verdict.message().contains("Too many failed attempts"));
    }

    #[test]
    fn wrong_code_is_invalid() {
        let now = Utc::now();
        let r = record(2, 1, now);
        assert_eq!(evaluate(Some(&r), now, |_| false), OtpVerdict::Invalid);
    }

    #[test]
    fn matching_code_is_valid() {
        let now = Utc::now();
        let r = record(4, 9, now);
        let verdict = evaluate(Some(&r), now, |hash| hash == "hash-of-123456");
        assert!(verdict.is_valid());
    }

    #[test]
    fn purpose_parses_wire_names() {
        assert_eq!("signup".parse::<OtpPurpose>().unwrap(), OtpPurpose::Signup);
        assert_eq!(
            "forgot-password".parse::<OtpPurpose>().unwrap(),
            OtpPurpose::ForgotPassword
        );
        assert!("login".parse::<OtpPurpose>().is_err());
        assert_eq!(
            serde_json::to_value(OtpPurpose::ForgotPassword).unwrap(),
            "forgot-password"
        );
    }
}
