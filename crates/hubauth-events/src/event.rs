//! Device ownership event payloads and subject naming.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Event name for device removal notifications.
pub const DEVICES_UNREGISTERED: &str = "devices.unregistered";

/// Subject addressing events about one owner's devices.
///
/// Convention: `owners.<owner>.<event>`.
pub fn owner_subject(owner: &str, event: &str) -> String {
    format!("owners.{owner}.{event}")
}

/// Identity on whose behalf an operation was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub user_id: String,
}

/// Notification that devices were removed from an owner's account.
///
/// `device_ids` lists only the devices actually deleted; a partially
/// failed bulk deletion reports its partial progress here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicesUnregistered {
    pub owner: String,
    pub device_ids: Vec<String>,
    pub audit_context: AuditContext,
    /// Epoch seconds at which the deletion completed.
    pub timestamp: i64,
}

impl DevicesUnregistered {
    /// Build the event, stamped with the current time.
    pub fn new(
        owner: impl Into<String>,
        device_ids: Vec<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            device_ids,
            audit_context: AuditContext {
                user_id: user_id.into(),
            },
            timestamp: Utc::now().timestamp(),
        }
    }

    /// The per-owner subject this event is addressed to.
    pub fn subject(&self) -> String {
        owner_subject(&self.owner, DEVICES_UNREGISTERED)
    }

    /// Serialize the payload for publishing.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, EventError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_is_scoped_to_the_owner() {
        let event = DevicesUnregistered::new("u1", vec!["d1".to_string()], "u1");
        assert_eq!(event.subject(), "owners.u1.devices.unregistered");
    }

    #[test]
    fn payload_carries_all_fields() {
        let event = DevicesUnregistered::new("u1", vec!["d1".to_string(), "d2".to_string()], "admin");
        let bytes = event.to_json_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["owner"], "u1");
        assert_eq!(value["device_ids"][1], "d2");
        assert_eq!(value["audit_context"]["user_id"], "admin");
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }
}
