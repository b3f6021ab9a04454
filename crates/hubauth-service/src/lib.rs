//! # hubauth-service
//!
//! The device-authorization lifecycle state machine.
//!
//! [`DeviceAuthService`] issues, validates, refreshes and revokes
//! per-device tokens and tracks which account each device belongs to. It
//! depends on the transactional record store, a [`TokenProvider`] for the
//! OAuth exchange with the external identity provider, and an event
//! publisher for best-effort removal notifications.
//!
//! Cross-call consistency is delegated entirely to the store's session
//! isolation; the service holds no mutable state of its own. The one
//! exception is [`csrf::CsrfTokens`], an expiring set owned by the
//! HTTP-facing surface.

pub mod csrf;
pub mod error;
pub mod expiry;
pub mod models;
pub mod owner;
pub mod provider;
pub mod service;

pub use csrf::CsrfTokens;
pub use error::{AuthError, ErrorCode};
pub use owner::{OwnerPrecedence, RequestContext, SERVICE_OWNER};
pub use provider::{OAuth2Config, OAuth2Provider, ProviderError, ProviderToken, TokenProvider};
pub use service::{DeviceAuthService, DeviceStream};
