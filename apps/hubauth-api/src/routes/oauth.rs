//! OAuth redirect-flow handlers.
//!
//! `authorize` issues a one-time CSRF token and redirects the browser to
//! the identity provider; `callback` consumes the token and exchanges the
//! authorization code.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use hubauth_service::AuthError;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn authorize(State(state): State<AppState>) -> Redirect {
    let csrf_token = state.csrf.issue().await;
    Redirect::temporary(&state.provider.auth_code_url(&csrf_token))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    state: String,
    #[serde(default)]
    code: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>, ApiError> {
    if !state.csrf.consume(&query.state).await {
        debug!("callback carried an unknown or reused state token");
        return Err(AuthError::Unauthenticated("invalid state token".to_string()).into());
    }
    if query.code.is_empty() {
        return Err(AuthError::InvalidArgument("authorization code is required".to_string()).into());
    }

    let token = state
        .provider
        .exchange(&query.code)
        .await
        .map_err(|err| {
            AuthError::Unauthenticated(format!("cannot exchange authorization code: {err}"))
        })?;

    Ok(Json(CallbackResponse {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        user_id: token.owner,
    }))
}
