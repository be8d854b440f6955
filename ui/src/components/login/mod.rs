//! Login and first-time setup screens

use leptos::*;
use leptos_router::*;

use crate::client::{AdminClient, SetupInitRequest, SetupStatus};
use crate::components::common::{ErrorBanner, ThemeToggle};
use crate::state::AppState;

/// Centered card with the product title
#[component]
fn AuthCard(title: &'static str, children: Children) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-theme-bg flex items-center justify-center p-4">
            <div class="absolute top-4 right-4">
                <ThemeToggle />
            </div>
            <div class="max-w-md w-full">
                <div class="text-center mb-8">
                    <h1 class="text-3xl font-bold text-theme mb-2">"check-cx"</h1>
                    <p class="text-theme-secondary">"模型可用性检测 · 管理后台"</p>
                </div>
                <div class="bg-theme-surface border border-theme-border rounded-xl p-6 shadow-lg">
                    <h2 class="text-xl font-semibold text-theme mb-6">{title}</h2>
                    {children()}
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let navigate = use_navigate();

    let (identifier, set_identifier) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (error, set_error) = create_signal(Option::<String>::None);
    let (submitting, set_submitting) = create_signal(false);
    let (status, set_status) = create_signal(Option::<SetupStatus>::None);

    // Send visitors to the setup wizard until an admin exists
    {
        let app_state = app_state.clone();
        let navigate = navigate.clone();
        create_effect(move |prev: Option<()>| {
            if prev.is_some() {
                return;
            }
            let app_state = app_state.clone();
            let navigate = navigate.clone();
            spawn_local(async move {
                match app_state.client().setup_status().await {
                    Ok(s) if !s.is_setup => navigate("/setup", Default::default()),
                    Ok(s) => set_status.set(Some(s)),
                    Err(e) => tracing::debug!("Setup status unavailable: {}", e),
                }
            });
        });
    }

    let on_submit = {
        let app_state = app_state.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let identifier_val = identifier.get().trim().to_string();
            let password_val = password.get();
            if identifier_val.is_empty() || password_val.is_empty() {
                set_error.set(Some("请输入用户名和密码".to_string()));
                return;
            }

            set_error.set(None);
            set_submitting.set(true);
            let app_state = app_state.clone();
            let navigate = navigate.clone();
            spawn_local(async move {
                match app_state.client().login(&identifier_val, &password_val).await {
                    Ok(response) => match response.token {
                        Some(token) if response.success => {
                            app_state.sign_in(token);
                            navigate("/", Default::default());
                        }
                        _ => set_error.set(Some(response.message)),
                    },
                    Err(e) => set_error.set(Some(e.user_message("登录失败，请稍后重试"))),
                }
                set_submitting.set(false);
            });
        }
    };

    let authenticated = {
        let app_state = app_state.clone();
        move || app_state.is_authenticated()
    };

    view! {
        <Show when=authenticated fallback=move || view! {
            <AuthCard title="登录">
                <ErrorBanner message=error />
                <form on:submit=on_submit.clone() class="space-y-4 mt-4">
                    <div>
                        <label class="block text-theme-secondary text-sm mb-1">"用户名或邮箱"</label>
                        <input
                            type="text"
                            class="input"
                            autocomplete="username"
                            prop:value=identifier
                            on:input=move |ev| set_identifier.set(event_target_value(&ev))
                        />
                    </div>
                    <div>
                        <label class="block text-theme-secondary text-sm mb-1">"密码"</label>
                        <input
                            type="password"
                            class="input"
                            autocomplete="current-password"
                            prop:value=password
                            on:input=move |ev| set_password.set(event_target_value(&ev))
                        />
                    </div>
                    <button type="submit" class="btn-primary w-full disabled:opacity-50" disabled=submitting>
                        {move || if submitting.get() { "登录中..." } else { "登录" }}
                    </button>
                </form>
                <p class="mt-4 text-center text-xs text-theme-muted">
                    {move || status.get().map(|s| format!("版本 {}", s.version))}
                </p>
            </AuthCard>
        }>
            <Redirect path="/" />
        </Show>
    }
}

/// First-time setup: create the initial admin account
#[component]
pub fn SetupPage() -> impl IntoView {
    let app_state = expect_context::<AppState>();

    let (username, set_username) = create_signal(String::new());
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (confirm_password, set_confirm_password) = create_signal(String::new());
    let (error, set_error) = create_signal(Option::<String>::None);
    let (submitting, set_submitting) = create_signal(false);
    let (setup_complete, set_setup_complete) = create_signal(false);

    let status = {
        let app_state = app_state.clone();
        create_local_resource(|| (), move |_| {
            let app_state = app_state.clone();
            async move { app_state.client().setup_status().await }
        })
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let request = SetupInitRequest {
            username: username.get().trim().to_string(),
            email: email.get().trim().to_string(),
            password: password.get(),
        };

        if let Some(message) = validate_setup(&request, &confirm_password.get()) {
            set_error.set(Some(message.to_string()));
            return;
        }

        set_error.set(None);
        set_submitting.set(true);
        let app_state = app_state.clone();
        spawn_local(async move {
            match app_state.client().setup_init(&request).await {
                Ok(()) => set_setup_complete.set(true),
                Err(e) => set_error.set(Some(e.user_message("初始化失败"))),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <AuthCard title="创建管理员账号">
            <Suspense fallback=|| view! { <p class="text-theme-secondary">"正在检查初始化状态..."</p> }>
                {
                    let on_submit = on_submit.clone();
                    move || match status.get() {
                        Some(Ok(s)) if s.is_setup && !setup_complete.get() => view! {
                            <div class="text-center">
                                <p class="text-theme-secondary mb-4">"系统已完成初始化"</p>
                                <A href="/login" class="btn-primary">"前往登录"</A>
                            </div>
                        }.into_view(),
                        Some(Ok(_)) if setup_complete.get() => view! {
                            <div class="text-center">
                                <p class="text-emerald-500 mb-4">"管理员账号已创建"</p>
                                <A href="/login" class="btn-primary">"前往登录"</A>
                            </div>
                        }.into_view(),
                        Some(Ok(_)) => view! {
                            <ErrorBanner message=error />
                            <form on:submit=on_submit.clone() class="space-y-4 mt-4">
                                <div>
                                    <label class="block text-theme-secondary text-sm mb-1">"用户名"</label>
                                    <input type="text" class="input" placeholder="admin"
                                        prop:value=username
                                        on:input=move |ev| set_username.set(event_target_value(&ev)) />
                                </div>
                                <div>
                                    <label class="block text-theme-secondary text-sm mb-1">"邮箱"</label>
                                    <input type="email" class="input" placeholder="admin@example.com"
                                        prop:value=email
                                        on:input=move |ev| set_email.set(event_target_value(&ev)) />
                                </div>
                                <div>
                                    <label class="block text-theme-secondary text-sm mb-1">"密码"</label>
                                    <input type="password" class="input"
                                        prop:value=password
                                        on:input=move |ev| set_password.set(event_target_value(&ev)) />
                                </div>
                                <div>
                                    <label class="block text-theme-secondary text-sm mb-1">"确认密码"</label>
                                    <input type="password" class="input"
                                        prop:value=confirm_password
                                        on:input=move |ev| set_confirm_password.set(event_target_value(&ev)) />
                                </div>
                                <button type="submit" class="btn-primary w-full disabled:opacity-50" disabled=submitting>
                                    {move || if submitting.get() { "创建中..." } else { "创建管理员账号" }}
                                </button>
                            </form>
                        }.into_view(),
                        Some(Err(e)) => view! {
                            <p class="text-red-500 text-center">{e.user_message("无法检查初始化状态")}</p>
                        }.into_view(),
                        None => ().into_view(),
                    }
                }
            </Suspense>
        </AuthCard>
    }
}

/// Client-side checks mirroring the server's setup rules
fn validate_setup(request: &SetupInitRequest, confirm_password: &str) -> Option<&'static str> {
    if request.username.chars().count() < 3 {
        return Some("用户名至少需要 3 个字符");
    }
    if !request.email.contains('@') || !request.email.contains('.') {
        return Some("邮箱格式不正确");
    }
    if request.password.chars().count() < 8 {
        return Some("密码至少需要 8 个字符");
    }
    if request.password != confirm_password {
        return Some("两次输入的密码不一致");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> SetupInitRequest {
        SetupInitRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_setup() {
        assert_eq!(validate_setup(&request("admin", "a@b.co", "supersecret"), "supersecret"), None);
        assert!(validate_setup(&request("ad", "a@b.co", "supersecret"), "supersecret").is_some());
        assert!(validate_setup(&request("admin", "ab.co", "supersecret"), "supersecret").is_some());
        assert!(validate_setup(&request("admin", "a@b.co", "short"), "short").is_some());
        assert_eq!(
            validate_setup(&request("admin", "a@b.co", "supersecret"), "different"),
            Some("两次输入的密码不一致")
        );
    }
}
