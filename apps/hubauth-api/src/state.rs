//! Shared handler state.

use std::sync::Arc;

use hubauth_service::{CsrfTokens, DeviceAuthService, TokenProvider};

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DeviceAuthService>,
    pub provider: Arc<dyn TokenProvider>,
    pub csrf: Arc<CsrfTokens>,
}
