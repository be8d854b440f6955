//! Wire types for the check-cx control plane
//!
//! These types are exchanged as JSON between the console UI, the
//! management CLI and the control plane API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider types offered by the console's type picker.
///
/// The control plane stores any non-empty type string; this list only
/// drives the UI.
pub const PROVIDER_TYPES: &[&str] = &[
    "openai",
    "gemini",
    "anthropic",
    "azure-openai",
    "groq",
    "deepseek",
    "mistral",
    "xai",
    "openai-compatible",
];

/// Group filter value selecting check configs without a group
pub const UNGROUPED_FILTER: &str = "__ungrouped__";

/// Page size of the check config list
pub const CONFIGS_PER_PAGE: i64 = 20;

/// Maximum length of a group name, in characters
pub const GROUP_NAME_MAX_CHARS: usize = 80;

// =============================================================================
// Check Configs
// =============================================================================

/// A check config as returned by the API (the api key is never returned)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub provider_type: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub enabled: Option<bool>,
    pub is_maintenance: Option<bool>,
    pub request_header: Option<BTreeMap<String, String>>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub group_name: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl CheckConfig {
    /// Whether the config is switched on (a missing flag counts as off)
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn in_maintenance(&self) -> bool {
        self.is_maintenance.unwrap_or(false)
    }
}

/// Payload for creating, updating or copying a check config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConfigInput {
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub model: String,
    pub endpoint: String,
    /// Replace the stored key (update/copy only; create always needs a key)
    #[serde(default)]
    pub update_api_key: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub is_maintenance: bool,
    #[serde(default)]
    pub request_header: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub group_name: String,
}

/// Query parameters of the check config list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    /// Raw page parameter; anything that is not a positive integer means page 1
    #[serde(default)]
    pub page: Option<String>,
}

impl ConfigListQuery {
    /// One-based page number
    pub fn page_number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// One page of check configs plus the group names for the filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigListResponse {
    pub rows: Vec<CheckConfig>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetMaintenanceRequest {
    pub is_maintenance: bool,
}

// =============================================================================
// Groups
// =============================================================================

/// A group row with the number of check configs filed under it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: String,
    pub group_name: String,
    pub website_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// `None` when the count could not be read
    #[serde(default)]
    pub config_count: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupInput {
    pub group_name: String,
    pub website_url: String,
}

/// Per-field validation messages for the group form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupFieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

impl GroupFieldErrors {
    pub fn is_empty(&self) -> bool {
        self.group_name.is_none() && self.website_url.is_none()
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Severity of a system notification banner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Warning,
    Error,
}

impl NotificationLevel {
    pub const ALL: [NotificationLevel; 3] = [Self::Info, Self::Warning, Self::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        }
    }

    /// Parse a stored level; unknown values read as `Info`
    pub fn from_db(value: &str) -> Self {
        match value {
            "warning" => NotificationLevel::Warning,
            "error" => NotificationLevel::Error,
            _ => NotificationLevel::Info,
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNotification {
    pub id: String,
    pub message: String,
    pub level: NotificationLevel,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationInput {
    pub message: String,
    #[serde(default)]
    pub level: NotificationLevel,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Dashboard counters; each count is `None` when it could not be read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_configs: Option<i64>,
    pub enabled_configs: Option<i64>,
    pub maintenance_configs: Option<i64>,
    pub disabled_configs: Option<i64>,
    pub total_groups: Option<i64>,
    pub total_notifications: Option<i64>,
    pub active_notifications: Option<i64>,
    /// First groups by name; `None` when the group list could not be read
    pub groups: Option<Vec<GroupConfigCount>>,
    pub groups_remaining: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfigCount {
    pub id: String,
    pub name: String,
    pub config_count: Option<i64>,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
    pub user: Option<UserSummary>,
}

/// Claims of the current session as exposed by `/auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: Option<String>,
    pub exp: usize,
}

/// Generic error body returned by the control plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<GroupFieldErrors>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_config_type_field_is_renamed() {
        let json = serde_json::json!({
            "id": "c1",
            "name": "primary",
            "type": "openai",
            "model": "gpt-4o-mini",
            "endpoint": "https://api.openai.com/v1/chat/completions",
            "enabled": null,
            "is_maintenance": true,
            "request_header": {"x-trace": "1"},
            "metadata": null,
            "group_name": null,
            "created_at": null,
            "updated_at": null
        });

        let config: CheckConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.provider_type.as_deref(), Some("openai"));
        assert!(!config.is_enabled());
        assert!(config.in_maintenance());
        assert_eq!(config.request_header.unwrap()["x-trace"], "1");
    }

    #[test]
    fn test_notification_level_parsing() {
        assert_eq!(NotificationLevel::from_db("warning"), NotificationLevel::Warning);
        assert_eq!(NotificationLevel::from_db("error"), NotificationLevel::Error);
        assert_eq!(NotificationLevel::from_db("whatever"), NotificationLevel::Info);

        let level: NotificationLevel = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level.to_string(), "error");
    }

    #[test]
    fn test_config_list_page_falls_back_to_first() {
        let page = |raw: Option<&str>| ConfigListQuery {
            page: raw.map(str::to_string),
            ..Default::default()
        }
        .page_number();

        assert_eq!(page(None), 1);
        assert_eq!(page(Some("")), 1);
        assert_eq!(page(Some("abc")), 1);
        assert_eq!(page(Some("2.5")), 1);
        assert_eq!(page(Some("-3")), 1);
        assert_eq!(page(Some(" 4 ")), 4);
    }

    #[test]
    fn test_config_input_defaults() {
        let input: CheckConfigInput = serde_json::from_value(serde_json::json!({
            "name": "n",
            "type": "gemini",
            "model": "m",
            "endpoint": "https://example.com/v1"
        }))
        .unwrap();

        assert!(!input.update_api_key);
        assert!(input.api_key.is_empty());
        assert!(input.request_header.is_none());
        assert!(input.group_name.is_empty());
    }

    #[test]
    fn test_group_field_errors_skip_empty() {
        let errors = GroupFieldErrors {
            group_name: Some("分组名称不能为空".into()),
            website_url: None,
        };
        let json = serde_json::to_value(&errors).unwrap();
        assert!(json.get("website_url").is_none());
        assert!(!errors.is_empty());
        assert!(GroupFieldErrors::default().is_empty());
    }
}
