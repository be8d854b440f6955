//! System notification API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use checkcx_shared::{NotificationInput, SetActiveRequest, SystemNotification};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::db::repository::NotificationRepository;
use crate::AppState;

fn validate_message(input: &NotificationInput) -> Result<String, ApiError> {
    let message = input.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("通知内容不能为空".to_string()));
    }
    Ok(message.to_string())
}

fn not_found() -> ApiError {
    ApiError::NotFound("通知不存在".to_string())
}

/// List all notifications, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SystemNotification>>, ApiError> {
    let rows = NotificationRepository::list(state.db.pool())
        .await
        .map_err(|e| ApiError::database("加载通知失败", e))?;

    Ok(Json(rows.into_iter().map(SystemNotification::from).collect()))
}

pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NotificationInput>,
) -> Result<(StatusCode, Json<SystemNotification>), ApiError> {
    let message = validate_message(&input)?;

    let row = NotificationRepository::create(state.db.pool(), &message, input.level.as_str(), input.is_active)
        .await
        .map_err(|e| ApiError::database("创建通知失败", e))?;

    info!("Created {} notification: {}", input.level, row.id);
    Ok((StatusCode::CREATED, Json(SystemNotification::from(row))))
}

pub async fn update_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<NotificationInput>,
) -> Result<Json<SystemNotification>, ApiError> {
    let message = validate_message(&input)?;

    let row = NotificationRepository::update(
        state.db.pool(),
        &id,
        &message,
        input.level.as_str(),
        input.is_active,
    )
    .await
    .map_err(|e| ApiError::database("更新通知失败", e))?
    .ok_or_else(not_found)?;

    Ok(Json(SystemNotification::from(row)))
}

/// Show or hide a notification banner
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<SystemNotification>, ApiError> {
    let row = NotificationRepository::set_active(state.db.pool(), &id, request.is_active)
        .await
        .map_err(|e| ApiError::database("更新通知状态失败", e))?
        .ok_or_else(not_found)?;

    Ok(Json(SystemNotification::from(row)))
}

pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = NotificationRepository::delete(state.db.pool(), &id)
        .await
        .map_err(|e| ApiError::database("删除通知失败", e))?;

    if !deleted {
        return Err(not_found());
    }
    info!("Deleted notification: {}", id);
    Ok(Json(json!({ "success": true })))
}
