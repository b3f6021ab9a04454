//! Request and response shapes of the lifecycle operations.
//!
//! String fields default to empty when absent; the service validates
//! presence and reports missing identifiers as invalid arguments.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddDeviceRequest {
    #[serde(default)]
    pub device_id: String,
    /// Explicit owner; overrides the bearer-token claim for registration.
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddDeviceResponse {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteDeviceRequest {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteDeviceResponse {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteDevicesRequest {
    #[serde(default)]
    pub device_ids: Vec<String>,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteDevicesResponse {
    /// Ids actually deleted; requested ids not found are absent, not an
    /// error.
    pub device_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub authorization_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    /// Remaining validity in seconds; `-1` when the token never expires.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignOutResponse {}

#[derive(Debug, Clone, Serialize)]
pub struct SignOffResponse {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetUserDevicesRequest {
    /// Owners to list; empty means the acting owner (or every owner for
    /// the wildcard identity).
    #[serde(default)]
    pub user_ids_filter: Vec<String>,
    /// Devices to narrow to; empty matches all.
    #[serde(default)]
    pub device_ids_filter: Vec<String>,
}

/// One device/owner pair emitted by the listing stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDevice {
    pub device_id: String,
    pub user_id: String,
}
