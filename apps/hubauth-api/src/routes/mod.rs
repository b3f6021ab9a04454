//! HTTP routes of the device-authorization API.

mod devices;
mod oauth;
mod session;

use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use hubauth_service::RequestContext;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/v1/devices",
            get(devices::get_user_devices).post(devices::add_device),
        )
        .route("/api/v1/devices/delete", post(devices::delete_devices))
        .route("/api/v1/devices/remove", post(devices::remove_device))
        .route(
            "/api/v1/devices/:device_id",
            axum::routing::delete(devices::delete_device),
        )
        .route("/api/v1/sign-up", post(session::sign_up))
        .route("/api/v1/sign-in", post(session::sign_in))
        .route("/api/v1/sign-out", post(session::sign_out))
        .route("/api/v1/sign-off", post(session::sign_off))
        .route("/api/v1/refresh-token", post(session::refresh_token))
        .route("/api/v1/oauth/authorize", get(oauth::authorize))
        .route("/api/v1/oauth/callback", get(oauth::callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Per-request context from the `Authorization: Bearer` header.
fn request_context(headers: &HeaderMap) -> RequestContext {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match bearer {
        Some(token) => RequestContext::with_bearer(token),
        None => RequestContext::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_tokens_are_extracted_from_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(
            request_context(&headers).bearer_token.as_deref(),
            Some("abc.def.ghi")
        );

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert!(request_context(&headers).bearer_token.is_none());
        assert!(request_context(&HeaderMap::new()).bearer_token.is_none());
    }
}
