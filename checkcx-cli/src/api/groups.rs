//! Group management API endpoints
//!
//! Groups carry a display name and website for the check configs filed
//! under them. A config belongs to a group by name.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use checkcx_shared::{GroupFieldErrors, GroupInfo, GroupInput, GROUP_NAME_MAX_CHARS};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::error::{is_unique_violation, ApiError};
use crate::db::repository::GroupInfoRepository;
use crate::AppState;

const DUPLICATE_NAME: &str = "分组名称已存在";

/// Validated group fields
#[derive(Debug, PartialEq)]
pub struct ValidGroup {
    pub group_name: String,
    pub website_url: String,
}

/// Check a group form, collecting every field error
pub fn validate_group(input: &GroupInput) -> Result<ValidGroup, ApiError> {
    let group_name = input.group_name.trim();
    let website_url = input.website_url.trim();
    let mut errors = GroupFieldErrors::default();

    if group_name.is_empty() {
        errors.group_name = Some("分组名称不能为空".to_string());
    } else if group_name.chars().count() > GROUP_NAME_MAX_CHARS {
        errors.group_name = Some(format!("分组名称不能超过 {} 个字符", GROUP_NAME_MAX_CHARS));
    }

    let url_ok = url::Url::parse(website_url)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);
    if !url_ok {
        errors.website_url = Some("请输入有效的 http(s) 网址".to_string());
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation {
            message: "分组信息有误".to_string(),
            field_errors: errors,
        });
    }

    Ok(ValidGroup {
        group_name: group_name.to_string(),
        website_url: website_url.to_string(),
    })
}

fn write_error(context: &str, e: sqlx::Error) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::Conflict(DUPLICATE_NAME.to_string())
    } else {
        ApiError::database(context, e)
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("分组不存在".to_string())
}

/// List all groups with their config counts
pub async fn list_groups(State(state): State<Arc<AppState>>) -> Result<Json<Vec<GroupInfo>>, ApiError> {
    let groups = GroupInfoRepository::list(state.db.pool())
        .await
        .map_err(|e| ApiError::database("加载分组失败", e))?;

    Ok(Json(groups.into_iter().map(GroupInfo::from).collect()))
}

/// Create a new group
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(input): Json<GroupInput>,
) -> Result<(StatusCode, Json<GroupInfo>), ApiError> {
    let group = validate_group(&input)?;
    let pool = state.db.pool();

    if let Ok(Some(_)) = GroupInfoRepository::get_by_name(pool, &group.group_name).await {
        return Err(ApiError::Conflict(DUPLICATE_NAME.to_string()));
    }

    let row = GroupInfoRepository::create(pool, &group.group_name, &group.website_url)
        .await
        .map_err(|e| write_error("创建分组失败", e))?;

    info!("Created group: {}", group.group_name);
    Ok((StatusCode::CREATED, Json(GroupInfo::from(row))))
}

/// Update a group
pub async fn update_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<GroupInput>,
) -> Result<Json<GroupInfo>, ApiError> {
    let group = validate_group(&input)?;
    let pool = state.db.pool();

    if let Ok(Some(existing)) = GroupInfoRepository::get_by_name(pool, &group.group_name).await {
        if existing.id != id {
            return Err(ApiError::Conflict(DUPLICATE_NAME.to_string()));
        }
    }

    let row = GroupInfoRepository::update(pool, &id, &group.group_name, &group.website_url)
        .await
        .map_err(|e| write_error("更新分组失败", e))?
        .ok_or_else(not_found)?;

    info!("Updated group: {}", id);
    Ok(Json(GroupInfo::from(row)))
}

/// Delete a group; configs keep their group name
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = GroupInfoRepository::delete(state.db.pool(), &id)
        .await
        .map_err(|e| ApiError::database("删除分组失败", e))?;

    if !deleted {
        return Err(not_found());
    }
    info!("Deleted group: {}", id);
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, url: &str) -> GroupInput {
        GroupInput {
            group_name: name.to_string(),
            website_url: url.to_string(),
        }
    }

    #[test]
    fn test_valid_group_is_trimmed() {
        let group = validate_group(&input("  prod ", " https://prod.example.com ")).unwrap();
        assert_eq!(group.group_name, "prod");
        assert_eq!(group.website_url, "https://prod.example.com");
    }

    #[test]
    fn test_collects_all_field_errors() {
        match validate_group(&input(" ", "example.com")) {
            Err(ApiError::Validation { field_errors, .. }) => {
                assert!(field_errors.group_name.is_some());
                assert!(field_errors.website_url.is_some());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_group_name_length_counts_chars() {
        let name: String = "组".repeat(GROUP_NAME_MAX_CHARS);
        assert!(validate_group(&input(&name, "https://a.example.com")).is_ok());

        let name: String = "组".repeat(GROUP_NAME_MAX_CHARS + 1);
        assert!(validate_group(&input(&name, "https://a.example.com")).is_err());
    }

    #[test]
    fn test_rejects_non_http_urls() {
        assert!(validate_group(&input("prod", "ftp://files.example.com")).is_err());
        assert!(validate_group(&input("prod", "")).is_err());
    }
}
