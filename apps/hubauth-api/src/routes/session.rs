//! Sign-up, sign-in, sign-out, sign-off and refresh handlers.

use axum::extract::State;
use axum::Json;

use hubauth_service::models::{
    RefreshTokenRequest, RefreshTokenResponse, SignInRequest, SignInResponse, SignOffResponse,
    SignOutResponse, SignUpRequest, SignUpResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<SignUpResponse>, ApiError> {
    Ok(Json(state.service.sign_up(&request).await?))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    Ok(Json(state.service.sign_in(&request).await?))
}

pub async fn sign_out(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignOutResponse>, ApiError> {
    Ok(Json(state.service.sign_out(&request).await?))
}

pub async fn sign_off(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignOffResponse>, ApiError> {
    Ok(Json(state.service.sign_off(&request).await?))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, ApiError> {
    Ok(Json(state.service.refresh_token(&request).await?))
}
