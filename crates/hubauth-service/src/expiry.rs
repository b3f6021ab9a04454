//! Remaining-validity calculation.
//!
//! Single source of truth for "is this token currently usable", consumed
//! by sign-in, sign-out, sign-up and refresh.

use chrono::{DateTime, Utc};

/// Sentinel returned for tokens that never expire.
pub const NO_EXPIRATION: i64 = -1;

/// Seconds of validity remaining for a token expiring at `expiry`.
///
/// `None` denotes a permanent token and yields `(NO_EXPIRATION, true)`,
/// distinct from every other outcome. Otherwise the remaining whole
/// seconds are returned, with `valid == false` once none remain.
pub fn expires_in(expiry: Option<DateTime<Utc>>) -> (i64, bool) {
    match expiry {
        None => (NO_EXPIRATION, true),
        Some(t) => {
            let remaining = (t - Utc::now()).num_seconds();
            (remaining, remaining > 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn unset_expiry_never_expires() {
        assert_eq!(expires_in(None), (NO_EXPIRATION, true));
    }

    #[test]
    fn past_expiry_is_invalid() {
        let (remaining, valid) = expires_in(Some(Utc::now() - Duration::minutes(1)));
        assert!(remaining <= 0);
        assert!(!valid);
    }

    #[test]
    fn future_expiry_reports_remaining_seconds() {
        let (remaining, valid) = expires_in(Some(Utc::now() + Duration::minutes(1)));
        assert!(valid);
        assert!(remaining > 55 && remaining <= 60, "remaining = {remaining}");
    }

    #[test]
    fn expiry_right_now_is_invalid() {
        let (remaining, valid) = expires_in(Some(Utc::now()));
        assert!(remaining <= 0);
        assert!(!valid);
    }
}
