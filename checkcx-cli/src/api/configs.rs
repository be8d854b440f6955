//! Check config API endpoints
//!
//! Provides endpoints for:
//! - Listing configs with search, group filter and pagination
//! - Create, update, copy and delete
//! - Toggling the enabled and maintenance flags

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use checkcx_shared::{
    CheckConfig, CheckConfigInput, ConfigListQuery, ConfigListResponse, SetEnabledRequest,
    SetMaintenanceRequest, CONFIGS_PER_PAGE, UNGROUPED_FILTER,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::db::models::CheckConfigWrite;
use crate::db::repository::{CheckConfigRepository, ConfigFilter, GroupFilter, GroupInfoRepository};
use crate::AppState;

// =============================================================================
// Input normalization
// =============================================================================

/// Strip LIKE wildcards and filter-syntax characters from a search term
pub fn sanitize_search(q: &str) -> Option<String> {
    let cleaned: String = q
        .chars()
        .filter(|c| *c != '%')
        .map(|c| if matches!(c, ',' | '(' | ')') { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

pub fn parse_group_filter(group: Option<&str>) -> GroupFilter {
    match group.map(str::trim) {
        None | Some("") => GroupFilter::All,
        Some(UNGROUPED_FILTER) => GroupFilter::Ungrouped,
        Some(name) => GroupFilter::Named(name.to_string()),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required(value: &str, message: &str) -> Result<String, ApiError> {
    non_empty(value).ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

/// Endpoints must be absolute http(s) URLs pointing at a concrete path
pub fn validate_endpoint(endpoint: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::BadRequest("端点必须是包含请求路径的 http(s) 地址".to_string());

    let url = url::Url::parse(endpoint).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    if url.path().is_empty() || url.path() == "/" {
        return Err(invalid());
    }
    Ok(())
}

/// How the api key of a payload is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyRule {
    /// A key must be supplied
    Required,
    /// Replace the stored key only when `update_api_key` is set
    Optional,
}

fn normalize_input(input: &CheckConfigInput, rule: KeyRule) -> Result<CheckConfigWrite, ApiError> {
    let name = required(&input.name, "名称不能为空")?;
    let provider_type = required(&input.provider_type, "类型不能为空")?;
    let model = required(&input.model, "模型不能为空")?;
    let endpoint = required(&input.endpoint, "端点不能为空")?;
    validate_endpoint(&endpoint)?;

    let wants_key = rule == KeyRule::Required || input.update_api_key;
    let api_key = if wants_key {
        Some(required(&input.api_key, "API Key 不能为空")?)
    } else {
        None
    };

    let request_header = match &input.request_header {
        Some(headers) if !headers.is_empty() => Some(json!(headers).to_string()),
        _ => None,
    };
    let metadata = match &input.metadata {
        Some(metadata) if !metadata.is_empty() => Some(Value::Object(metadata.clone()).to_string()),
        _ => None,
    };

    Ok(CheckConfigWrite {
        name,
        provider_type,
        model,
        endpoint,
        api_key,
        enabled: input.enabled,
        is_maintenance: input.is_maintenance,
        request_header,
        metadata,
        group_name: non_empty(&input.group_name),
    })
}

fn not_found() -> ApiError {
    ApiError::NotFound("配置不存在".to_string())
}

// =============================================================================
// Handlers
// =============================================================================

/// List check configs
pub async fn list_configs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfigListQuery>,
) -> Result<Json<ConfigListResponse>, ApiError> {
    let pool = state.db.pool();
    let page = query.page_number();
    let filter = ConfigFilter {
        search: query.q.as_deref().and_then(sanitize_search),
        group: parse_group_filter(query.group.as_deref()),
    };

    let (rows, total) = CheckConfigRepository::list(
        pool,
        &filter,
        CONFIGS_PER_PAGE,
        (page - 1).saturating_mul(CONFIGS_PER_PAGE),
    )
    .await
    .map_err(|e| ApiError::database("加载配置失败", e))?;

    let groups = GroupInfoRepository::list_names(pool)
        .await
        .map_err(|e| ApiError::database("加载分组失败", e))?;

    Ok(Json(ConfigListResponse {
        rows: rows.into_iter().map(CheckConfig::from).collect(),
        total,
        page,
        per_page: CONFIGS_PER_PAGE,
        groups,
    }))
}

/// Get a single check config
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CheckConfig>, ApiError> {
    CheckConfigRepository::get_by_id(state.db.pool(), &id)
        .await
        .map_err(|e| ApiError::database("加载配置失败", e))?
        .map(|row| Json(CheckConfig::from(row)))
        .ok_or_else(not_found)
}

/// Create a check config
pub async fn create_config(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CheckConfigInput>,
) -> Result<(StatusCode, Json<CheckConfig>), ApiError> {
    let write = normalize_input(&input, KeyRule::Required)?;

    let row = CheckConfigRepository::create(state.db.pool(), &write)
        .await
        .map_err(|e| ApiError::database("创建配置失败", e))?;

    info!("Created check config: {} ({})", write.name, row.id);
    Ok((StatusCode::CREATED, Json(CheckConfig::from(row))))
}

/// Update a check config
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<CheckConfigInput>,
) -> Result<Json<CheckConfig>, ApiError> {
    let write = normalize_input(&input, KeyRule::Optional)?;

    let row = CheckConfigRepository::update(state.db.pool(), &id, &write)
        .await
        .map_err(|e| ApiError::database("更新配置失败", e))?
        .ok_or_else(not_found)?;

    info!("Updated check config: {}", id);
    Ok(Json(CheckConfig::from(row)))
}

/// Insert a new config from the payload, reusing the source key unless replaced
pub async fn copy_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<CheckConfigInput>,
) -> Result<(StatusCode, Json<CheckConfig>), ApiError> {
    let pool = state.db.pool();

    let source = CheckConfigRepository::get_by_id(pool, &id)
        .await
        .map_err(|e| ApiError::database("加载源配置失败", e))?
        .ok_or_else(not_found)?;

    let mut write = normalize_input(&input, KeyRule::Optional)?;
    if write.api_key.is_none() {
        write.api_key = source.api_key.as_deref().and_then(non_empty);
    }
    if write.api_key.is_none() {
        return Err(ApiError::BadRequest("源配置没有 API Key，请填写新的 API Key".to_string()));
    }

    let row = CheckConfigRepository::create(pool, &write)
        .await
        .map_err(|e| ApiError::database("复制配置失败", e))?;

    info!("Copied check config {} to {}", id, row.id);
    Ok((StatusCode::CREATED, Json(CheckConfig::from(row))))
}

/// Delete a check config
pub async fn delete_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = CheckConfigRepository::delete(state.db.pool(), &id)
        .await
        .map_err(|e| ApiError::database("删除配置失败", e))?;

    if !deleted {
        return Err(not_found());
    }
    info!("Deleted check config: {}", id);
    Ok(Json(json!({ "success": true })))
}

/// Switch a config on or off
pub async fn set_enabled(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SetEnabledRequest>,
) -> Result<Json<Value>, ApiError> {
    let updated = CheckConfigRepository::set_enabled(state.db.pool(), &id, request.enabled)
        .await
        .map_err(|e| ApiError::database("更新启用状态失败", e))?;

    if !updated {
        return Err(not_found());
    }
    Ok(Json(json!({ "success": true, "enabled": request.enabled })))
}

/// Put a config into or out of maintenance
pub async fn set_maintenance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SetMaintenanceRequest>,
) -> Result<Json<Value>, ApiError> {
    let updated = CheckConfigRepository::set_maintenance(state.db.pool(), &id, request.is_maintenance)
        .await
        .map_err(|e| ApiError::database("更新维护状态失败", e))?;

    if !updated {
        return Err(not_found());
    }
    Ok(Json(json!({ "success": true, "is_maintenance": request.is_maintenance })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_search() {
        assert_eq!(sanitize_search("  "), None);
        assert_eq!(sanitize_search("%%"), None);
        assert_eq!(sanitize_search("gpt%4"), Some("gpt4".to_string()));
        assert_eq!(sanitize_search("a,b(c)"), Some("a b c".to_string()));
        assert_eq!(sanitize_search(" (openai) "), Some("openai".to_string()));
    }

    #[test]
    fn test_parse_group_filter() {
        assert_eq!(parse_group_filter(None), GroupFilter::All);
        assert_eq!(parse_group_filter(Some(" ")), GroupFilter::All);
        assert_eq!(parse_group_filter(Some("__ungrouped__")), GroupFilter::Ungrouped);
        assert_eq!(parse_group_filter(Some("prod")), GroupFilter::Named("prod".to_string()));
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("https://api.openai.com/v1/chat/completions").is_ok());
        assert!(validate_endpoint("http://localhost:8000/v1").is_ok());
        assert!(validate_endpoint("https://api.openai.com").is_err());
        assert!(validate_endpoint("https://api.openai.com/").is_err());
        assert!(validate_endpoint("ftp://example.com/v1").is_err());
        assert!(validate_endpoint("/v1/chat").is_err());
    }

    fn input() -> CheckConfigInput {
        CheckConfigInput {
            name: "  primary ".to_string(),
            provider_type: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: " sk-test ".to_string(),
            group_name: "   ".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_trims_and_nulls() {
        let write = normalize_input(&input(), KeyRule::Required).unwrap();
        assert_eq!(write.name, "primary");
        assert_eq!(write.api_key.as_deref(), Some("sk-test"));
        assert_eq!(write.group_name, None);
        assert_eq!(write.request_header, None);
    }

    #[test]
    fn test_normalize_key_rules() {
        let mut payload = input();
        payload.api_key = String::new();
        assert!(normalize_input(&payload, KeyRule::Required).is_err());

        // update without replacing the key
        let write = normalize_input(&payload, KeyRule::Optional).unwrap();
        assert!(write.api_key.is_none());

        payload.update_api_key = true;
        assert!(normalize_input(&payload, KeyRule::Optional).is_err());
    }

    #[test]
    fn test_normalize_requires_fields() {
        let mut payload = input();
        payload.model = " ".to_string();
        assert!(matches!(
            normalize_input(&payload, KeyRule::Required),
            Err(ApiError::BadRequest(_))
        ));
    }
}
