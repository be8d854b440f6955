//! `gloo-net` implementation of [`AdminClient`]

use checkcx_shared::{
    CheckConfig, CheckConfigInput, ConfigListQuery, ConfigListResponse, DashboardSummary, ErrorBody,
    GroupInfo, GroupInput, LoginRequest, LoginResponse, NotificationInput, SessionClaims,
    SetActiveRequest, SetEnabledRequest, SetMaintenanceRequest, SystemNotification,
};
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{AdminClient, AdminClientError, ClientResult};

/// Setup status from API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupStatus {
    pub is_setup: bool,
    pub version: String,
}

/// First admin account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupInitRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Client for the control plane on the page's origin
#[derive(Debug, Clone, Default)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(token: Option<String>) -> Self {
        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();
        Self {
            base_url: format!("{}/api/v1", origin),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(Request::get(&self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(Request::post(&self.url(path)))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.authorize(Request::put(&self.url(path)))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(Request::delete(&self.url(path)))
    }

    async fn send(builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| AdminClientError::Network(e.to_string()))?;
        check(response).await
    }

    async fn send_json<B: Serialize>(builder: RequestBuilder, body: &B) -> ClientResult<Response> {
        let request = builder
            .json(body)
            .map_err(|e| AdminClientError::Network(e.to_string()))?;
        let response = request
            .send()
            .await
            .map_err(|e| AdminClientError::Network(e.to_string()))?;
        check(response).await
    }
}

/// Turn non-2xx responses into errors carrying the server's message
async fn check(response: Response) -> ClientResult<Response> {
    if response.ok() {
        return Ok(response);
    }

    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();
    if status == 401 {
        return Err(AdminClientError::Unauthorized(body.error));
    }
    Err(AdminClientError::Api {
        status,
        message: body.error,
        field_errors: body.field_errors,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    response
        .json()
        .await
        .map_err(|e| AdminClientError::InvalidResponse(e.to_string()))
}

#[async_trait::async_trait(?Send)]
impl AdminClient for ApiClient {
    async fn setup_status(&self) -> ClientResult<SetupStatus> {
        decode(Self::send(self.get("/setup/status")).await?).await
    }

    async fn setup_init(&self, request: &SetupInitRequest) -> ClientResult<()> {
        // Failures carry `message` rather than `error`
        let response = self
            .post("/setup/init")
            .json(request)
            .map_err(|e| AdminClientError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| AdminClientError::Network(e.to_string()))?;
        if response.ok() {
            return Ok(());
        }
        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        Err(AdminClientError::Api {
            status,
            message: body["message"].as_str().unwrap_or_default().to_string(),
            field_errors: None,
        })
    }

    async fn login(&self, identifier: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        let response = self
            .post("/auth/login")
            .json(&request)
            .map_err(|e| AdminClientError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| AdminClientError::Network(e.to_string()))?;
        // Both success and failure use the LoginResponse shape
        decode(response).await
    }

    async fn current_user(&self) -> ClientResult<SessionClaims> {
        decode(Self::send(self.get("/auth/me")).await?).await
    }

    async fn dashboard(&self) -> ClientResult<DashboardSummary> {
        decode(Self::send(self.get("/dashboard")).await?).await
    }

    async fn list_configs(&self, query: &ConfigListQuery) -> ClientResult<ConfigListResponse> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
            params.push(("q", q.to_string()));
        }
        if let Some(group) = query.group.as_deref().filter(|g| !g.is_empty()) {
            params.push(("group", group.to_string()));
        }
        if let Some(page) = query.page.as_deref() {
            params.push(("page", page.to_string()));
        }
        decode(Self::send(self.get("/configs").query(params)).await?).await
    }

    async fn create_config(&self, input: &CheckConfigInput) -> ClientResult<CheckConfig> {
        decode(Self::send_json(self.post("/configs"), input).await?).await
    }

    async fn update_config(&self, id: &str, input: &CheckConfigInput) -> ClientResult<CheckConfig> {
        decode(Self::send_json(self.put(&format!("/configs/{}", id)), input).await?).await
    }

    async fn copy_config(&self, id: &str, input: &CheckConfigInput) -> ClientResult<CheckConfig> {
        decode(Self::send_json(self.post(&format!("/configs/{}/copy", id)), input).await?).await
    }

    async fn delete_config(&self, id: &str) -> ClientResult<()> {
        Self::send(self.delete(&format!("/configs/{}", id))).await.map(|_| ())
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> ClientResult<()> {
        let body = SetEnabledRequest { enabled };
        Self::send_json(self.put(&format!("/configs/{}/enabled", id)), &body).await.map(|_| ())
    }

    async fn set_maintenance(&self, id: &str, is_maintenance: bool) -> ClientResult<()> {
        let body = SetMaintenanceRequest { is_maintenance };
        Self::send_json(self.put(&format!("/configs/{}/maintenance", id)), &body).await.map(|_| ())
    }

    async fn list_groups(&self) -> ClientResult<Vec<GroupInfo>> {
        decode(Self::send(self.get("/groups")).await?).await
    }

    async fn create_group(&self, input: &GroupInput) -> ClientResult<GroupInfo> {
        decode(Self::send_json(self.post("/groups"), input).await?).await
    }

    async fn update_group(&self, id: &str, input: &GroupInput) -> ClientResult<GroupInfo> {
        decode(Self::send_json(self.put(&format!("/groups/{}", id)), input).await?).await
    }

    async fn delete_group(&self, id: &str) -> ClientResult<()> {
        Self::send(self.delete(&format!("/groups/{}", id))).await.map(|_| ())
    }

    async fn list_notifications(&self) -> ClientResult<Vec<SystemNotification>> {
        decode(Self::send(self.get("/notifications")).await?).await
    }

    async fn create_notification(&self, input: &NotificationInput) -> ClientResult<SystemNotification> {
        decode(Self::send_json(self.post("/notifications"), input).await?).await
    }

    async fn update_notification(&self, id: &str, input: &NotificationInput) -> ClientResult<SystemNotification> {
        decode(Self::send_json(self.put(&format!("/notifications/{}", id)), input).await?).await
    }

    async fn set_notification_active(&self, id: &str, is_active: bool) -> ClientResult<SystemNotification> {
        let body = SetActiveRequest { is_active };
        decode(Self::send_json(self.put(&format!("/notifications/{}/active", id)), &body).await?).await
    }

    async fn delete_notification(&self, id: &str) -> ClientResult<()> {
        Self::send(self.delete(&format!("/notifications/{}", id))).await.map(|_| ())
    }
}
