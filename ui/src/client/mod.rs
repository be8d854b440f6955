//! Control plane client
//!
//! The console talks to the check-cx control plane through the
//! [`AdminClient`] trait. [`ApiClient`] implements it over `gloo-net`
//! against `/api/v1` on the page's origin.

mod api;

pub use api::{ApiClient, SetupInitRequest, SetupStatus};

use async_trait::async_trait;
use checkcx_shared::{
    normalize_ui_error_message, CheckConfig, CheckConfigInput, ConfigListQuery, ConfigListResponse,
    DashboardSummary, GroupFieldErrors, GroupInfo, GroupInput, LoginResponse, NotificationInput,
    SessionClaims, SystemNotification,
};

/// Error types for control plane calls
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdminClientError {
    #[error("Request failed: {0}")]
    Network(String),

    /// Missing, invalid or expired session
    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        field_errors: Option<GroupFieldErrors>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AdminClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AdminClientError::Unauthorized(_))
    }

    pub fn field_errors(&self) -> Option<&GroupFieldErrors> {
        match self {
            AdminClientError::Api { field_errors, .. } => field_errors.as_ref(),
            _ => None,
        }
    }

    /// Text to show the user
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AdminClientError::Unauthorized(message) | AdminClientError::Api { message, .. } => {
                normalize_ui_error_message(message, fallback)
            }
            _ => fallback.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, AdminClientError>;

/// Operations the console performs against the control plane
#[async_trait(?Send)]
pub trait AdminClient {
    async fn setup_status(&self) -> ClientResult<SetupStatus>;
    async fn setup_init(&self, request: &SetupInitRequest) -> ClientResult<()>;
    async fn login(&self, identifier: &str, password: &str) -> ClientResult<LoginResponse>;
    async fn current_user(&self) -> ClientResult<SessionClaims>;

    async fn dashboard(&self) -> ClientResult<DashboardSummary>;

    async fn list_configs(&self, query: &ConfigListQuery) -> ClientResult<ConfigListResponse>;
    async fn create_config(&self, input: &CheckConfigInput) -> ClientResult<CheckConfig>;
    async fn update_config(&self, id: &str, input: &CheckConfigInput) -> ClientResult<CheckConfig>;
    async fn copy_config(&self, id: &str, input: &CheckConfigInput) -> ClientResult<CheckConfig>;
    async fn delete_config(&self, id: &str) -> ClientResult<()>;
    async fn set_enabled(&self, id: &str, enabled: bool) -> ClientResult<()>;
    async fn set_maintenance(&self, id: &str, is_maintenance: bool) -> ClientResult<()>;

    async fn list_groups(&self) -> ClientResult<Vec<GroupInfo>>;
    async fn create_group(&self, input: &GroupInput) -> ClientResult<GroupInfo>;
    async fn update_group(&self, id: &str, input: &GroupInput) -> ClientResult<GroupInfo>;
    async fn delete_group(&self, id: &str) -> ClientResult<()>;

    async fn list_notifications(&self) -> ClientResult<Vec<SystemNotification>>;
    async fn create_notification(&self, input: &NotificationInput) -> ClientResult<SystemNotification>;
    async fn update_notification(&self, id: &str, input: &NotificationInput) -> ClientResult<SystemNotification>;
    async fn set_notification_active(&self, id: &str, is_active: bool) -> ClientResult<SystemNotification>;
    async fn delete_notification(&self, id: &str) -> ClientResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_normalizes_backend_text() {
        let err = AdminClientError::Unauthorized("Unauthorized: invalid or expired token".to_string());
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message("操作失败"), "未登录或无权限");

        let err = AdminClientError::Api {
            status: 409,
            message: "分组名称已存在".to_string(),
            field_errors: None,
        };
        assert_eq!(err.user_message("操作失败"), "分组名称已存在");

        let err = AdminClientError::Network("TypeError: Failed to fetch".to_string());
        assert_eq!(err.user_message("网络异常"), "网络异常");
    }
}
