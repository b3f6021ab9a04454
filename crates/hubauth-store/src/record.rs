//! The persisted authorized-device record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One authorized device, the sole persisted entity.
///
/// Stored as a single document keyed by device id. At most one live record
/// exists per device, and its `owner` field is authoritative for all
/// authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Globally unique device id, the primary key.
    #[serde(rename = "_id")]
    pub device_id: String,

    /// Account identity the device currently belongs to.
    pub owner: String,

    /// Opaque access token issued by the identity provider; empty until
    /// the first sign-up.
    #[serde(rename = "accesstoken")]
    pub access_token: String,

    /// Opaque refresh token.
    #[serde(rename = "refreshtoken")]
    pub refresh_token: String,

    /// Access-token expiry as epoch seconds; `0` means the token never
    /// expires.
    pub expiry: i64,
}

impl DeviceRecord {
    /// Create a record with empty tokens, as written by device
    /// registration before any sign-up.
    pub fn unprovisioned(device_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            owner: owner.into(),
            access_token: String::new(),
            refresh_token: String::new(),
            expiry: 0,
        }
    }

    /// The expiry instant, or `None` for a permanent token.
    pub fn expiry_time(&self) -> Option<DateTime<Utc>> {
        if self.expiry == 0 {
            None
        } else {
            DateTime::from_timestamp(self.expiry, 0)
        }
    }
}

/// Convert an optional expiry instant to its stored epoch-seconds form,
/// where `None` (never expires) maps to `0`.
pub fn expiry_epoch(expiry: Option<DateTime<Utc>>) -> i64 {
    expiry.map_or(0, |t| t.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stored_field_names_match_the_document_schema() {
        let record = DeviceRecord {
            device_id: "d1".to_string(),
            owner: "u1".to_string(),
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expiry: 42,
        };
        let doc = mongodb::bson::to_document(&record).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), "d1");
        assert_eq!(doc.get_str("owner").unwrap(), "u1");
        assert_eq!(doc.get_str("accesstoken").unwrap(), "at");
        assert_eq!(doc.get_str("refreshtoken").unwrap(), "rt");
        assert_eq!(doc.get_i64("expiry").unwrap(), 42);
    }

    #[test]
    fn zero_expiry_is_permanent() {
        let record = DeviceRecord::unprovisioned("d1", "u1");
        assert_eq!(record.expiry, 0);
        assert!(record.expiry_time().is_none());
    }

    #[test]
    fn expiry_round_trips_through_epoch_seconds() {
        let t = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(expiry_epoch(Some(t)), t.timestamp());
        assert_eq!(expiry_epoch(None), 0);

        let record = DeviceRecord {
            expiry: t.timestamp(),
            ..DeviceRecord::unprovisioned("d1", "u1")
        };
        assert_eq!(record.expiry_time(), Some(t));
    }
}
