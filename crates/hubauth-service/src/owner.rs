//! Acting-owner resolution.
//!
//! Derives the owner identity an operation acts for from the request's
//! explicit owner field, the bearer token carried in the request context,
//! or the privileged wildcard identity.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;
use tracing::debug;

/// Wildcard owner identity: a privileged internal caller representing no
/// individual account.
pub const SERVICE_OWNER: &str = "*";

/// Per-request metadata the transport layer hands to the service.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Bearer token from the request metadata, if any.
    pub bearer_token: Option<String>,
}

impl RequestContext {
    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }
}

/// Which source wins when both the request field and the token claim
/// carry an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerPrecedence {
    /// An explicit request field overrides the claim (device
    /// registration).
    RequestField,
    /// The claim overrides the request field whenever it is present
    /// (deletion and listing).
    Claim,
}

/// Failure to extract an owner claim from a bearer token.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("token is not a JWT")]
    Malformed,
    #[error("cannot decode token payload: {0}")]
    Payload(String),
    #[error("token has no usable {claim} claim")]
    MissingClaim { claim: String },
}

/// Extract the named owner claim from a JWT without verifying it.
///
/// Signature verification is the transport layer's concern; this only
/// reads the already-authenticated token's payload.
pub fn parse_owner_claim(claim: &str, token: &str) -> Result<String, ClaimError> {
    let payload = token.split('.').nth(1).ok_or(ClaimError::Malformed)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ClaimError::Payload(e.to_string()))?;
    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| ClaimError::Payload(e.to_string()))?;
    claims
        .get(claim)
        .and_then(|v| v.as_str())
        .filter(|owner| !owner.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ClaimError::MissingClaim {
            claim: claim.to_string(),
        })
}

/// Owner carried by the context's bearer token, if one parses.
///
/// A parse failure leaves the claim unresolved without failing the call;
/// the operation decides what an unresolved owner means.
pub fn owner_from_context(ctx: &RequestContext, owner_claim: &str) -> Option<String> {
    let token = ctx.bearer_token.as_deref()?;
    match parse_owner_claim(owner_claim, token) {
        Ok(owner) => Some(owner),
        Err(err) => {
            debug!(error = %err, "cannot resolve owner from bearer token");
            None
        }
    }
}

/// Resolve the acting owner for one operation.
///
/// Returns `None` when neither source yields an owner; the caller reports
/// that as an invalid-argument condition.
pub fn resolve_owner(
    request_owner: &str,
    ctx: &RequestContext,
    owner_claim: &str,
    precedence: OwnerPrecedence,
) -> Option<String> {
    let claim_owner = owner_from_context(ctx, owner_claim);
    match precedence {
        OwnerPrecedence::RequestField => {
            if !request_owner.is_empty() {
                Some(request_owner.to_string())
            } else {
                claim_owner
            }
        }
        OwnerPrecedence::Claim => {
            if claim_owner.is_some() {
                claim_owner
            } else if !request_owner.is_empty() {
                Some(request_owner.to_string())
            } else {
                None
            }
        }
    }
}
