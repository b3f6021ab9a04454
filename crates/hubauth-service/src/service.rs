//! The device-authorization lifecycle state machine.

use std::collections::HashSet;
use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{info, warn};

use hubauth_events::{DevicesUnregistered, EventPublisher};
use hubauth_store::record::expiry_epoch;
use hubauth_store::{DeviceRecord, Store, Transaction};

use crate::error::AuthError;
use crate::expiry::expires_in;
use crate::models::{
    AddDeviceRequest, AddDeviceResponse, DeleteDeviceRequest, DeleteDeviceResponse,
    DeleteDevicesRequest, DeleteDevicesResponse, GetUserDevicesRequest, RefreshTokenRequest,
    RefreshTokenResponse, SignInRequest, SignInResponse, SignOffResponse, SignOutResponse,
    SignUpRequest, SignUpResponse, UserDevice,
};
use crate::owner::{owner_from_context, resolve_owner, OwnerPrecedence, RequestContext,
    SERVICE_OWNER};
use crate::provider::TokenProvider;

/// Stream of device/owner pairs produced by the listing operation.
///
/// A store failure surfaces as an `Err` item mid-stream.
pub type DeviceStream = BoxStream<'static, Result<UserDevice, AuthError>>;

/// Issues, validates, refreshes and revokes per-device tokens, and tracks
/// which account each device belongs to.
///
/// Every operation opens one transaction up front and releases it on every
/// path, including early validation failures. Cross-call consistency is
/// the store's concern; the service itself is stateless.
pub struct DeviceAuthService {
    store: Arc<dyn Store>,
    provider: Arc<dyn TokenProvider>,
    publisher: Arc<dyn EventPublisher>,
    owner_claim: String,
}

impl DeviceAuthService {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn TokenProvider>,
        publisher: Arc<dyn EventPublisher>,
        owner_claim: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            publisher,
            owner_claim: owner_claim.into(),
        }
    }

    /// Register a device to the resolved owner with empty tokens.
    ///
    /// Idempotent for the same (device, owner) pair; a device claimed by a
    /// different owner is a permission-denied failure and leaves the
    /// existing record unchanged.
    pub async fn add_device(
        &self,
        request: &AddDeviceRequest,
        ctx: &RequestContext,
    ) -> Result<AddDeviceResponse, AuthError> {
        let mut tx = self.store.new_transaction().await;

        let owner = resolve_owner(
            &request.user_id,
            ctx,
            &self.owner_claim,
            OwnerPrecedence::RequestField,
        )
        .ok_or_else(|| AuthError::InvalidArgument("cannot resolve owner".to_string()))?;
        if request.device_id.is_empty() {
            return Err(AuthError::InvalidArgument("device id is required".to_string()));
        }

        match tx.retrieve_by_device(&request.device_id).await? {
            Some(existing) if existing.owner == owner => Ok(AddDeviceResponse {}),
            Some(_) => Err(AuthError::PermissionDenied(format!(
                "device {} is owned by another user",
                request.device_id
            ))),
            None => {
                tx.persist(&DeviceRecord::unprovisioned(&request.device_id, &owner))
                    .await?;
                info!(device_id = %request.device_id, owner = %owner, "device added");
                Ok(AddDeviceResponse {})
            }
        }
    }

    /// Delete one device record owned by the resolved owner.
    pub async fn delete_device(
        &self,
        request: &DeleteDeviceRequest,
        ctx: &RequestContext,
    ) -> Result<DeleteDeviceResponse, AuthError> {
        let mut tx = self.store.new_transaction().await;

        let owner = resolve_owner(
            &request.user_id,
            ctx,
            &self.owner_claim,
            OwnerPrecedence::Claim,
        )
        .ok_or_else(|| AuthError::InvalidArgument("cannot resolve owner".to_string()))?;
        if request.device_id.is_empty() {
            return Err(AuthError::InvalidArgument("device id is required".to_string()));
        }

        tx.delete(&request.device_id, &owner).await?;
        info!(device_id = %request.device_id, owner = %owner, "device deleted");
        Ok(DeleteDeviceResponse {})
    }

    /// Alias of [`delete_device`](Self::delete_device), kept as a separate
    /// operation name on the wire.
    pub async fn remove_device(
        &self,
        request: &DeleteDeviceRequest,
        ctx: &RequestContext,
    ) -> Result<DeleteDeviceResponse, AuthError> {
        self.delete_device(request, ctx).await
    }

    /// Delete a set of device records, skipping ids not owned by the
    /// resolved owner, and notify listeners of the ids actually deleted.
    ///
    /// Not atomic across the set: a failure partway leaves earlier
    /// deletions in place. The notification is best-effort: a publish
    /// failure is logged and never fails the call.
    pub async fn delete_devices(
        &self,
        request: &DeleteDevicesRequest,
        ctx: &RequestContext,
    ) -> Result<DeleteDevicesResponse, AuthError> {
        let mut tx = self.store.new_transaction().await;

        let owner = resolve_owner(
            &request.user_id,
            ctx,
            &self.owner_claim,
            OwnerPrecedence::Claim,
        )
        .ok_or_else(|| AuthError::InvalidArgument("cannot resolve owner".to_string()))?;

        let ids = dedupe_ids(&request.device_ids);
        if ids.is_empty() {
            return Err(AuthError::InvalidArgument("no device ids".to_string()));
        }

        let mut deleted = Vec::with_capacity(ids.len());
        for device_id in ids {
            // A retrieve failure aborts the whole call; an id simply not
            // present for this owner is skipped.
            match tx.retrieve(&device_id, &owner).await? {
                None => continue,
                Some(_) => match tx.delete(&device_id, &owner).await {
                    Ok(()) => deleted.push(device_id),
                    // Confirmed present a moment ago; any failure to
                    // delete it now aborts the call as not-found.
                    Err(err) => {
                        return Err(AuthError::NotFound(format!(
                            "cannot delete device {device_id}: {err}"
                        )))
                    }
                },
            }
        }

        if !deleted.is_empty() {
            info!(owner = %owner, count = deleted.len(), "devices deleted");
            self.publish_unregistered(&owner, &deleted).await;
        }

        Ok(DeleteDevicesResponse { device_ids: deleted })
    }

    async fn publish_unregistered(&self, owner: &str, device_ids: &[String]) {
        let event = DevicesUnregistered::new(owner, device_ids.to_vec(), owner);
        let payload = match event.to_json_bytes() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(owner = %owner, error = %err, "cannot encode devices unregistered event");
                return;
            }
        };
        if let Err(err) = self.publisher.publish_data(&event.subject(), payload).await {
            warn!(owner = %owner, error = %err, "cannot publish devices unregistered event");
        }
    }

    /// Exchange an authorization code and bind the resulting token to the
    /// device, creating or replacing its record.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, AuthError> {
        let mut tx = self.store.new_transaction().await;

        if request.device_id.is_empty() || request.authorization_code.is_empty() {
            return Err(AuthError::InvalidArgument(
                "device id and authorization code are required".to_string(),
            ));
        }

        let token = self
            .provider
            .exchange(&request.authorization_code)
            .await
            .map_err(|err| {
                AuthError::Unauthenticated(format!("cannot exchange authorization code: {err}"))
            })?;

        if let Some(existing) = tx.retrieve_by_device(&request.device_id).await? {
            if existing.owner != token.owner {
                return Err(AuthError::Unauthenticated(format!(
                    "device {} is already signed up with another user",
                    request.device_id
                )));
            }
        }

        let (remaining, valid) = expires_in(token.expiry);
        if !valid {
            return Err(AuthError::Unauthenticated("expired access token".to_string()));
        }

        tx.persist(&DeviceRecord {
            device_id: request.device_id.clone(),
            owner: token.owner.clone(),
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expiry: expiry_epoch(token.expiry),
        })
        .await?;

        info!(device_id = %request.device_id, owner = %token.owner, "device signed up");
        Ok(SignUpResponse {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.owner,
            expires_in: remaining,
        })
    }

    /// Validate the presented token against the stored record.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<SignInResponse, AuthError> {
        let mut tx = self.store.new_transaction().await;
        let remaining = check_access(
            tx.as_mut(),
            &request.device_id,
            &request.user_id,
            &request.access_token,
        )
        .await?;
        Ok(SignInResponse {
            expires_in: remaining,
        })
    }

    /// Same checks as sign-in; confirms validity without mutating.
    pub async fn sign_out(&self, request: &SignInRequest) -> Result<SignOutResponse, AuthError> {
        let mut tx = self.store.new_transaction().await;
        check_access(
            tx.as_mut(),
            &request.device_id,
            &request.user_id,
            &request.access_token,
        )
        .await?;
        Ok(SignOutResponse {})
    }

    /// Explicit revocation: same checks as sign-in, then deletes the
    /// record.
    pub async fn sign_off(&self, request: &SignInRequest) -> Result<SignOffResponse, AuthError> {
        let mut tx = self.store.new_transaction().await;
        check_access(
            tx.as_mut(),
            &request.device_id,
            &request.user_id,
            &request.access_token,
        )
        .await?;

        // The record was just confirmed present; any delete failure here,
        // including a lost race, is an internal condition.
        tx.delete(&request.device_id, &request.user_id)
            .await
            .map_err(|err| AuthError::Internal(format!("cannot delete device record: {err}")))?;

        info!(device_id = %request.device_id, owner = %request.user_id, "device signed off");
        Ok(SignOffResponse {})
    }

    /// Obtain fresh tokens from the stored refresh token and upsert the
    /// record.
    pub async fn refresh_token(
        &self,
        request: &RefreshTokenRequest,
    ) -> Result<RefreshTokenResponse, AuthError> {
        let mut tx = self.store.new_transaction().await;

        if request.device_id.is_empty() || request.refresh_token.is_empty() {
            return Err(AuthError::InvalidArgument(
                "device id and refresh token are required".to_string(),
            ));
        }

        let token = self
            .provider
            .refresh(&request.refresh_token)
            .await
            .map_err(|err| AuthError::Unauthenticated(format!("cannot refresh token: {err}")))?;

        // Providers may omit the owner from a refresh response; fall back
        // to the owner named in the request.
        let owner = if !token.owner.is_empty() {
            token.owner.clone()
        } else if !request.user_id.is_empty() {
            request.user_id.clone()
        } else {
            return Err(AuthError::Unauthenticated(
                "cannot resolve owner of refreshed token".to_string(),
            ));
        };

        let (remaining, valid) = expires_in(token.expiry);
        if !valid {
            return Err(AuthError::Unauthenticated("expired access token".to_string()));
        }

        // Some providers rotate the refresh token, some return none; keep
        // the presented one in that case.
        let refresh_token = if token.refresh_token.is_empty() {
            request.refresh_token.clone()
        } else {
            token.refresh_token.clone()
        };

        tx.persist(&DeviceRecord {
            device_id: request.device_id.clone(),
            owner: owner.clone(),
            access_token: token.access_token.clone(),
            refresh_token: refresh_token.clone(),
            expiry: expiry_epoch(token.expiry),
        })
        .await?;

        info!(device_id = %request.device_id, owner = %owner, "device token refreshed");
        Ok(RefreshTokenResponse {
            access_token: token.access_token,
            refresh_token,
            expires_in: remaining,
        })
    }

    /// Stream device/owner pairs visible to the caller.
    ///
    /// The wildcard owner without a filter lists across all owners, a
    /// privileged internal caller. A normal owner only ever sees their
    /// own devices, whatever the filter says.
    pub async fn get_user_devices(
        &self,
        request: &GetUserDevicesRequest,
        ctx: &RequestContext,
    ) -> Result<DeviceStream, AuthError> {
        let tx = self.store.new_transaction().await;

        let claim_owner = owner_from_context(ctx, &self.owner_claim);
        let user_filter = dedupe_ids(&request.user_ids_filter);

        // Each entry is one scan: `None` is the unrestricted scan only the
        // wildcard identity may run.
        let scans: Vec<Option<String>> = match claim_owner.as_deref() {
            Some(SERVICE_OWNER) => {
                if user_filter.is_empty() {
                    vec![None]
                } else {
                    user_filter.into_iter().map(Some).collect()
                }
            }
            Some(owner) => {
                if user_filter.is_empty() || user_filter.iter().any(|u| u == owner) {
                    vec![Some(owner.to_string())]
                } else {
                    Vec::new()
                }
            }
            None => {
                if user_filter.is_empty() {
                    return Err(AuthError::InvalidArgument(
                        "cannot resolve owner".to_string(),
                    ));
                }
                user_filter.into_iter().map(Some).collect()
            }
        };

        let device_filter: HashSet<String> = request
            .device_ids_filter
            .iter()
            .filter(|id| !id.is_empty())
            .cloned()
            .collect();

        let stream = try_stream! {
            let mut tx = tx;
            for scan in scans {
                let mut records = tx.retrieve_all(scan.as_deref()).await;
                while let Some(item) = records.next().await {
                    let record = item?;
                    if device_filter.is_empty() || device_filter.contains(&record.device_id) {
                        yield UserDevice {
                            device_id: record.device_id,
                            user_id: record.owner,
                        };
                    }
                }
            }
        };
        Ok(stream.boxed())
    }
}

/// Shared sign-in/sign-out/sign-off validation: the record must exist for
/// (device, owner), the stored access token must match the presented one,
/// and it must be unexpired.
async fn check_access(
    tx: &mut dyn Transaction,
    device_id: &str,
    owner: &str,
    access_token: &str,
) -> Result<i64, AuthError> {
    if device_id.is_empty() || owner.is_empty() || access_token.is_empty() {
        return Err(AuthError::InvalidArgument(
            "device id, user id and access token are required".to_string(),
        ));
    }

    let record = tx
        .retrieve(device_id, owner)
        .await?
        .ok_or_else(|| AuthError::Unauthenticated("device is not signed up".to_string()))?;

    if record.access_token != access_token {
        return Err(AuthError::Unauthenticated("access token mismatch".to_string()));
    }

    let (remaining, valid) = expires_in(record.expiry_time());
    if !valid {
        return Err(AuthError::Unauthenticated("expired access token".to_string()));
    }
    Ok(remaining)
}

/// Drop empty ids and duplicates, preserving first-seen order.
fn dedupe_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| !id.is_empty() && seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::dedupe_ids;

    #[test]
    fn dedupe_discards_empties_and_duplicates() {
        let ids = vec![
            "d1".to_string(),
            String::new(),
            "d2".to_string(),
            "d1".to_string(),
        ];
        assert_eq!(dedupe_ids(&ids), vec!["d1".to_string(), "d2".to_string()]);
    }
}
