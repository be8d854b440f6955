//! Authentication and setup API endpoints
//!
//! Provides endpoints for:
//! - First-time setup (creating the first admin)
//! - User login/logout
//! - Session claims for the console's user menu

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use checkcx_shared::{LoginRequest, LoginResponse, SessionClaims, UserSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{generate_jwt, hash_password, verify_password, AuthenticatedUser};
use crate::db::repository::UserRepository;
use crate::AppState;

/// Response for setup status check
#[derive(Debug, Serialize, Deserialize)]
pub struct SetupStatusResponse {
    /// Whether setup has been completed (admin user exists)
    pub is_setup: bool,
    pub version: String,
}

/// Request to initialize the application (create first admin)
#[derive(Debug, Deserialize)]
pub struct SetupInitRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SetupInitResponse {
    pub success: bool,
    pub message: String,
    pub user: Option<UserSummary>,
}

impl SetupInitResponse {
    fn failure(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            message: message.to_string(),
            user: None,
        })
    }
}

fn login_failure(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(LoginResponse {
        success: false,
        message: message.to_string(),
        token: None,
        user: None,
    })).into_response()
}

/// Check if initial setup has been completed
pub async fn setup_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.is_fresh().await {
        Ok(is_fresh) => (StatusCode::OK, Json(SetupStatusResponse {
            is_setup: !is_fresh,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })).into_response(),
        Err(e) => {
            error!("Failed to check setup status: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({
                "error": "检查初始化状态失败"
            }))).into_response()
        }
    }
}

/// Initialize the application with the first admin user
pub async fn setup_init(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetupInitRequest>,
) -> impl IntoResponse {
    match state.db.is_fresh().await {
        Ok(true) => {}
        Ok(false) => {
            return (StatusCode::CONFLICT, SetupInitResponse::failure("系统已完成初始化")).into_response();
        }
        Err(e) => {
            error!("Failed to check setup status: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, SetupInitResponse::failure("检查初始化状态失败"))
                .into_response();
        }
    }

    let username = request.username.trim();
    let email = request.email.trim();

    if username.chars().count() < 3 {
        return (StatusCode::BAD_REQUEST, SetupInitResponse::failure("用户名至少需要 3 个字符")).into_response();
    }
    if request.password.chars().count() < 8 {
        return (StatusCode::BAD_REQUEST, SetupInitResponse::failure("密码至少需要 8 个字符")).into_response();
    }
    if !email.contains('@') || !email.contains('.') {
        return (StatusCode::BAD_REQUEST, SetupInitResponse::failure("邮箱格式不正确")).into_response();
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, SetupInitResponse::failure("处理密码失败"))
                .into_response();
        }
    };

    match UserRepository::create(state.db.pool(), username, email, &password_hash).await {
        Ok(user) => {
            info!("Initial admin user created: {}", username);
            (StatusCode::CREATED, Json(SetupInitResponse {
                success: true,
                message: "管理员账号已创建".to_string(),
                user: Some(UserSummary::from(user)),
            })).into_response()
        }
        Err(e) => {
            error!("Failed to create admin user: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, SetupInitResponse::failure("创建管理员账号失败"))
                .into_response()
        }
    }
}

/// Login with username/email and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    let pool = state.db.pool();
    let identifier = request.identifier.trim();

    let user = if identifier.contains('@') {
        UserRepository::get_by_email(pool, identifier).await
    } else {
        UserRepository::get_by_username(pool, identifier).await
    };

    let user = match user {
        Ok(Some(user)) => user,
        Ok(None) => return login_failure(StatusCode::UNAUTHORIZED, "用户名或密码错误"),
        Err(e) => {
            error!("Database error during login: {}", e);
            return login_failure(StatusCode::INTERNAL_SERVER_ERROR, "登录失败");
        }
    };

    if !verify_password(&request.password, &user.password_hash) {
        return login_failure(StatusCode::UNAUTHORIZED, "用户名或密码错误");
    }

    if let Err(e) = UserRepository::update_last_login(pool, &user.id).await {
        warn!("Failed to update last login time: {}", e);
    }

    let token = match generate_jwt(&state.auth, &user.id, user.email.as_deref()) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to generate JWT: {}", e);
            return login_failure(StatusCode::INTERNAL_SERVER_ERROR, "创建会话失败");
        }
    };

    info!("User logged in: {}", user.username.as_deref().unwrap_or("unknown"));

    (StatusCode::OK, Json(LoginResponse {
        success: true,
        message: "登录成功".to_string(),
        token: Some(token),
        user: Some(UserSummary::from(user)),
    })).into_response()
}

/// Logout; the client discards its token
pub async fn logout() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({
        "success": true,
        "message": "已退出登录"
    })))
}

/// Claims of the bearer token that authenticated this request
pub async fn current_user(Extension(user): Extension<AuthenticatedUser>) -> impl IntoResponse {
    (StatusCode::OK, Json(SessionClaims {
        sub: user.user_id,
        email: user.email,
        exp: user.expires_at,
    }))
}
