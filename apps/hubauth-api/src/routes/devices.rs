//! Device registration, deletion and listing handlers.

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use serde::Deserialize;

use hubauth_service::models::{
    AddDeviceRequest, AddDeviceResponse, DeleteDeviceRequest, DeleteDeviceResponse,
    DeleteDevicesRequest, DeleteDevicesResponse, GetUserDevicesRequest,
};

use crate::error::ApiError;
use crate::routes::request_context;
use crate::state::AppState;

pub async fn add_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddDeviceRequest>,
) -> Result<Json<AddDeviceResponse>, ApiError> {
    let ctx = request_context(&headers);
    Ok(Json(state.service.add_device(&request, &ctx).await?))
}

#[derive(Debug, Deserialize)]
pub struct DeleteDeviceQuery {
    #[serde(default)]
    user_id: String,
}

pub async fn delete_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(device_id): Path<String>,
    Query(query): Query<DeleteDeviceQuery>,
) -> Result<Json<DeleteDeviceResponse>, ApiError> {
    let ctx = request_context(&headers);
    let request = DeleteDeviceRequest {
        device_id,
        user_id: query.user_id,
    };
    Ok(Json(state.service.delete_device(&request, &ctx).await?))
}

/// Wire alias of device deletion, kept as its own route name.
pub async fn remove_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DeleteDeviceRequest>,
) -> Result<Json<DeleteDeviceResponse>, ApiError> {
    let ctx = request_context(&headers);
    Ok(Json(state.service.remove_device(&request, &ctx).await?))
}

pub async fn delete_devices(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DeleteDevicesRequest>,
) -> Result<Json<DeleteDevicesResponse>, ApiError> {
    let ctx = request_context(&headers);
    Ok(Json(state.service.delete_devices(&request, &ctx).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated owner filter.
    #[serde(default)]
    user_ids: String,
    /// Comma-separated device filter.
    #[serde(default)]
    device_ids: String,
}

fn split_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stream the visible device/owner pairs as newline-delimited JSON.
pub async fn get_user_devices(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let ctx = request_context(&headers);
    let request = GetUserDevicesRequest {
        user_ids_filter: split_filter(&query.user_ids),
        device_ids_filter: split_filter(&query.device_ids),
    };

    let stream = state.service.get_user_devices(&request, &ctx).await?;
    let body = Body::from_stream(stream.map(|item| {
        item.map_err(axum::Error::new).and_then(|device| {
            serde_json::to_vec(&device)
                .map(|mut line| {
                    line.push(b'\n');
                    Bytes::from(line)
                })
                .map_err(axum::Error::new)
        })
    }));

    Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(body)
        .map_err(|e| hubauth_service::AuthError::Internal(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::split_filter;

    #[test]
    fn filters_split_on_commas_and_drop_blanks() {
        assert_eq!(split_filter("u1, u2,,u1"), vec!["u1", "u2", "u1"]);
        assert!(split_filter("").is_empty());
        assert!(split_filter(" , ").is_empty());
    }
}
