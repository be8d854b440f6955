//! Database models for the check-cx control plane
//!
//! These structs map to database tables and are used for queries. API
//! responses use the wire types from `checkcx_shared`.

use checkcx_shared::{CheckConfig, GroupInfo, NotificationLevel, SystemNotification, UserSummary};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use tracing::warn;

// =============================================================================
// Check Config Models
// =============================================================================

/// Check config database model
#[derive(Debug, Clone, FromRow)]
pub struct CheckConfigRow {
    pub id: String,
    pub name: Option<String>,
    #[sqlx(rename = "type")]
    pub provider_type: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub enabled: Option<bool>,
    pub is_maintenance: Option<bool>,
    pub request_header: Option<String>,
    pub metadata: Option<String>,
    pub group_name: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<CheckConfigRow> for CheckConfig {
    fn from(row: CheckConfigRow) -> Self {
        let request_header = row
            .request_header
            .as_deref()
            .and_then(|raw| parse_json_column::<BTreeMap<String, String>>(&row.id, "request_header", raw));
        let metadata = row
            .metadata
            .as_deref()
            .and_then(|raw| parse_json_column::<serde_json::Map<String, serde_json::Value>>(&row.id, "metadata", raw));

        Self {
            id: row.id,
            name: row.name,
            provider_type: row.provider_type,
            model: row.model,
            endpoint: row.endpoint,
            enabled: row.enabled,
            is_maintenance: row.is_maintenance,
            request_header,
            metadata,
            group_name: row.group_name,
            created_at: Some(row.created_at),
            updated_at: row.updated_at,
        }
    }
}

fn parse_json_column<T: serde::de::DeserializeOwned>(id: &str, column: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable {} on check config {}: {}", column, id, e);
            None
        }
    }
}

/// Normalized check config fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfigWrite {
    pub name: String,
    pub provider_type: String,
    pub model: String,
    pub endpoint: String,
    /// `None` keeps the stored key on update
    pub api_key: Option<String>,
    pub enabled: bool,
    pub is_maintenance: bool,
    /// JSON text
    pub request_header: Option<String>,
    /// JSON text
    pub metadata: Option<String>,
    pub group_name: Option<String>,
}

// =============================================================================
// Group Models
// =============================================================================

/// Group database model joined with its config count
#[derive(Debug, Clone, FromRow)]
pub struct GroupInfoRow {
    pub id: String,
    pub group_name: String,
    pub website_url: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub config_count: i64,
}

impl From<GroupInfoRow> for GroupInfo {
    fn from(row: GroupInfoRow) -> Self {
        Self {
            id: row.id,
            group_name: row.group_name,
            website_url: row.website_url,
            created_at: Some(row.created_at),
            updated_at: row.updated_at,
            config_count: Some(row.config_count),
        }
    }
}

// =============================================================================
// Notification Models
// =============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: String,
    pub message: String,
    pub level: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<NotificationRow> for SystemNotification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            message: row.message,
            level: NotificationLevel::from_db(&row.level),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// User & Auth Models
// =============================================================================

/// User database model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}
