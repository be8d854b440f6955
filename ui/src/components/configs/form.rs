//! Create/edit/copy dialog for check configs

use checkcx_shared::{CheckConfig, CheckConfigInput, PROVIDER_TYPES};
use leptos::*;
use std::collections::BTreeMap;

use crate::client::AdminClient;
use crate::components::common::{ErrorBanner, Modal};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
    Copy,
}

impl FormMode {
    fn title(&self) -> &'static str {
        match self {
            FormMode::Create => "新建检测配置",
            FormMode::Edit => "编辑检测配置",
            FormMode::Copy => "复制检测配置",
        }
    }

    /// Whether the stored key can be kept
    fn has_stored_key(&self) -> bool {
        !matches!(self, FormMode::Create)
    }
}

/// Editable fields of the dialog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigForm {
    pub name: String,
    pub provider_type: String,
    pub model: String,
    pub endpoint: String,
    pub update_api_key: bool,
    pub api_key: String,
    pub enabled: bool,
    pub is_maintenance: bool,
    /// JSON object of header name to value
    pub request_header: String,
    /// JSON object
    pub metadata: String,
    pub group_name: String,
}

impl ConfigForm {
    pub fn new() -> Self {
        Self {
            provider_type: PROVIDER_TYPES[0].to_string(),
            enabled: true,
            ..Default::default()
        }
    }

    pub fn from_config(config: &CheckConfig, mode: FormMode) -> Self {
        let name = config.name.clone().unwrap_or_default();
        Self {
            name: if mode == FormMode::Copy { format!("{} (副本)", name) } else { name },
            provider_type: config.provider_type.clone().unwrap_or_default(),
            model: config.model.clone().unwrap_or_default(),
            endpoint: config.endpoint.clone().unwrap_or_default(),
            update_api_key: false,
            api_key: String::new(),
            enabled: config.is_enabled(),
            is_maintenance: config.in_maintenance(),
            request_header: config
                .request_header
                .as_ref()
                .filter(|h| !h.is_empty())
                .and_then(|h| serde_json::to_string_pretty(h).ok())
                .unwrap_or_default(),
            metadata: config
                .metadata
                .as_ref()
                .filter(|m| !m.is_empty())
                .and_then(|m| serde_json::to_string_pretty(m).ok())
                .unwrap_or_default(),
            group_name: config.group_name.clone().unwrap_or_default(),
        }
    }

    /// Validate the form and build the request payload
    pub fn to_input(&self, mode: FormMode) -> Result<CheckConfigInput, String> {
        for (value, message) in [
            (&self.name, "名称不能为空"),
            (&self.provider_type, "类型不能为空"),
            (&self.model, "模型不能为空"),
            (&self.endpoint, "端点不能为空"),
        ] {
            if value.trim().is_empty() {
                return Err(message.to_string());
            }
        }
        if !endpoint_looks_valid(self.endpoint.trim()) {
            return Err("端点必须是包含请求路径的 http(s) 地址".to_string());
        }

        let update_api_key = !mode.has_stored_key() || self.update_api_key;
        if update_api_key && self.api_key.trim().is_empty() {
            return Err("API Key 不能为空".to_string());
        }

        let request_header = parse_json_field::<BTreeMap<String, String>>(&self.request_header)
            .map_err(|_| "请求头必须是字符串键值对的 JSON 对象".to_string())?;
        let metadata = parse_json_field::<serde_json::Map<String, serde_json::Value>>(&self.metadata)
            .map_err(|_| "元数据必须是 JSON 对象".to_string())?;

        Ok(CheckConfigInput {
            name: self.name.trim().to_string(),
            provider_type: self.provider_type.trim().to_string(),
            model: self.model.trim().to_string(),
            endpoint: self.endpoint.trim().to_string(),
            update_api_key,
            api_key: if update_api_key { self.api_key.trim().to_string() } else { String::new() },
            enabled: self.enabled,
            is_maintenance: self.is_maintenance,
            request_header,
            metadata,
            group_name: self.group_name.trim().to_string(),
        })
    }
}

fn endpoint_looks_valid(endpoint: &str) -> bool {
    match url::Url::parse(endpoint) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some()
                && !url.path().is_empty()
                && url.path() != "/"
        }
        Err(_) => false,
    }
}

/// Blank text means "not set"
fn parse_json_field<T: serde::de::DeserializeOwned>(text: &str) -> Result<Option<T>, serde_json::Error> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

#[component]
pub fn ConfigFormDialog(
    mode: FormMode,
    /// Source row for edit/copy
    source: Option<CheckConfig>,
    /// Existing group names for the picker
    groups: Vec<String>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(into)] on_saved: Callback<()>,
) -> impl IntoView {
    let app_state = expect_context::<AppState>();
    let initial = match &source {
        Some(config) => ConfigForm::from_config(config, mode),
        None => ConfigForm::new(),
    };
    let source_id = source.map(|c| c.id);

    let form = create_rw_signal(initial);
    let (error, set_error) = create_signal(Option::<String>::None);
    let (saving, set_saving) = create_signal(false);

    let save = move |_: web_sys::MouseEvent| {
        let input = match form.with_untracked(|f| f.to_input(mode)) {
            Ok(input) => input,
            Err(message) => {
                set_error.set(Some(message));
                return;
            }
        };

        set_error.set(None);
        set_saving.set(true);
        let app_state = app_state.clone();
        let source_id = source_id.clone();
        spawn_local(async move {
            let client = app_state.client();
            let result = match (mode, source_id.as_deref()) {
                (FormMode::Edit, Some(id)) => client.update_config(id, &input).await,
                (FormMode::Copy, Some(id)) => client.copy_config(id, &input).await,
                _ => client.create_config(&input).await,
            };
            set_saving.set(false);
            match result {
                Ok(config) => {
                    tracing::info!("Saved check config {}", config.id);
                    on_saved.call(());
                }
                Err(e) => set_error.set(Some(app_state.error_message(&e, "保存失败"))),
            }
        });
    };

    let text_field = move |label: &'static str, placeholder: &'static str, get: fn(&ConfigForm) -> String, set: fn(&mut ConfigForm, String)| {
        view! {
            <div>
                <label class="block text-theme-secondary text-sm mb-1">{label}</label>
                <input
                    type="text"
                    class="input"
                    placeholder=placeholder
                    prop:value=move || form.with(get)
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        form.update(|f| set(f, value));
                    }
                />
            </div>
        }
    };

    view! {
        <Modal
            title=mode.title().to_string()
            on_close=on_close
            width="w-[640px]"
            footer=Box::new(move || view! {
                <button class="btn-secondary" on:click=move |_| on_close.call(())>"取消"</button>
                <button class="btn-primary disabled:opacity-50" disabled=saving on:click=save.clone()>
                    {move || if saving.get() { "保存中..." } else { "保存" }}
                </button>
            })
        >
            <ErrorBanner message=error />

            <div class="grid grid-cols-2 gap-4">
                {text_field("名称", "主账号 GPT-4o", |f| f.name.clone(), |f, v| f.name = v)}
                <div>
                    <label class="block text-theme-secondary text-sm mb-1">"类型"</label>
                    <select
                        class="input"
                        on:change=move |ev| {
                            let value = event_target_value(&ev);
                            form.update(|f| f.provider_type = value);
                        }
                    >
                        {move || {
                            let current = form.with(|f| f.provider_type.clone());
                            let mut options: Vec<String> = PROVIDER_TYPES.iter().map(|t| t.to_string()).collect();
                            if !current.is_empty() && !options.contains(&current) {
                                options.push(current.clone());
                            }
                            options
                                .into_iter()
                                .map(|t| {
                                    let selected = t == current;
                                    view! { <option value=t.clone() selected=selected>{t}</option> }
                                })
                                .collect_view()
                        }}
                    </select>
                </div>
                {text_field("模型", "gpt-4o-mini", |f| f.model.clone(), |f, v| f.model = v)}
                <div>
                    <label class="block text-theme-secondary text-sm mb-1">"分组"</label>
                    <input
                        type="text"
                        class="input"
                        list="config-group-options"
                        placeholder="未分组"
                        prop:value=move || form.with(|f| f.group_name.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            form.update(|f| f.group_name = value);
                        }
                    />
                    <datalist id="config-group-options">
                        {groups.into_iter().map(|g| view! { <option value=g /> }).collect_view()}
                    </datalist>
                </div>
            </div>

            {text_field("端点", "https://api.openai.com/v1/chat/completions", |f| f.endpoint.clone(), |f, v| f.endpoint = v)}

            <div>
                {mode.has_stored_key().then(|| view! {
                    <label class="flex items-center gap-2 text-sm text-theme-secondary mb-2">
                        <input
                            type="checkbox"
                            prop:checked=move || form.with(|f| f.update_api_key)
                            on:change=move |ev| {
                                let checked = event_target_checked(&ev);
                                form.update(|f| f.update_api_key = checked);
                            }
                        />
                        {if mode == FormMode::Copy { "使用新的 API Key（默认沿用原配置）" } else { "更新 API Key" }}
                    </label>
                })}
                <Show when=move || !mode.has_stored_key() || form.with(|f| f.update_api_key)>
                    <label class="block text-theme-secondary text-sm mb-1">"API Key"</label>
                    <input
                        type="password"
                        class="input"
                        autocomplete="off"
                        prop:value=move || form.with(|f| f.api_key.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            form.update(|f| f.api_key = value);
                        }
                    />
                </Show>
            </div>

            <div class="flex items-center gap-6">
                <label class="flex items-center gap-2 text-sm text-theme">
                    <input
                        type="checkbox"
                        prop:checked=move || form.with(|f| f.enabled)
                        on:change=move |ev| {
                            let checked = event_target_checked(&ev);
                            form.update(|f| f.enabled = checked);
                        }
                    />
                    "启用"
                </label>
                <label class="flex items-center gap-2 text-sm text-theme">
                    <input
                        type="checkbox"
                        prop:checked=move || form.with(|f| f.is_maintenance)
                        on:change=move |ev| {
                            let checked = event_target_checked(&ev);
                            form.update(|f| f.is_maintenance = checked);
                        }
                    />
                    "维护中"
                </label>
            </div>

            <div class="grid grid-cols-2 gap-4">
                <div>
                    <label class="block text-theme-secondary text-sm mb-1">"请求头 (JSON)"</label>
                    <textarea
                        class="input font-mono text-xs h-28"
                        placeholder="{\"x-api-version\": \"2024-06-01\"}"
                        prop:value=move || form.with(|f| f.request_header.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            form.update(|f| f.request_header = value);
                        }
                    />
                </div>
                <div>
                    <label class="block text-theme-secondary text-sm mb-1">"元数据 (JSON)"</label>
                    <textarea
                        class="input font-mono text-xs h-28"
                        placeholder="{\"region\": \"us\"}"
                        prop:value=move || form.with(|f| f.metadata.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            form.update(|f| f.metadata = value);
                        }
                    />
                </div>
            </div>
        </Modal>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ConfigForm {
        ConfigForm {
            name: " primary ".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: "sk-test".to_string(),
            ..ConfigForm::new()
        }
    }

    fn stored() -> CheckConfig {
        CheckConfig {
            id: "c1".to_string(),
            name: Some("primary".to_string()),
            provider_type: Some("gemini".to_string()),
            model: Some("gemini-1.5-flash".to_string()),
            endpoint: Some("https://generativelanguage.googleapis.com/v1beta/models".to_string()),
            enabled: None,
            is_maintenance: Some(true),
            request_header: Some(BTreeMap::from([("x-goog".to_string(), "1".to_string())])),
            metadata: None,
            group_name: Some("Google".to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_create_requires_key() {
        let input = filled().to_input(FormMode::Create).unwrap();
        assert_eq!(input.name, "primary");
        assert_eq!(input.provider_type, "openai");
        assert!(input.update_api_key);
        assert_eq!(input.api_key, "sk-test");
        assert!(input.enabled);

        let form = ConfigForm { api_key: "  ".to_string(), ..filled() };
        assert_eq!(form.to_input(FormMode::Create).unwrap_err(), "API Key 不能为空");
    }

    #[test]
    fn test_edit_keeps_stored_key_unless_asked() {
        let form = ConfigForm { api_key: String::new(), ..filled() };
        let input = form.to_input(FormMode::Edit).unwrap();
        assert!(!input.update_api_key);
        assert!(input.api_key.is_empty());

        let form = ConfigForm { update_api_key: true, api_key: String::new(), ..filled() };
        assert!(form.to_input(FormMode::Edit).is_err());
    }

    #[test]
    fn test_endpoint_and_json_fields() {
        let form = ConfigForm { endpoint: "https://api.openai.com/".to_string(), ..filled() };
        assert!(form.to_input(FormMode::Create).is_err());

        let form = ConfigForm { request_header: "{\"a\": 1}".to_string(), ..filled() };
        assert!(form.to_input(FormMode::Create).is_err());

        let form = ConfigForm {
            request_header: "{\"x-trace\": \"on\"}".to_string(),
            metadata: "{\"region\": \"us\", \"weight\": 2}".to_string(),
            ..filled()
        };
        let input = form.to_input(FormMode::Create).unwrap();
        assert_eq!(input.request_header.unwrap()["x-trace"], "on");
        assert_eq!(input.metadata.unwrap()["weight"], 2);
    }

    #[test]
    fn test_from_config() {
        let form = ConfigForm::from_config(&stored(), FormMode::Edit);
        assert_eq!(form.name, "primary");
        assert_eq!(form.provider_type, "gemini");
        assert!(!form.enabled);
        assert!(form.is_maintenance);
        assert!(form.request_header.contains("x-goog"));
        assert!(form.metadata.is_empty());
        assert_eq!(form.group_name, "Google");

        let copy = ConfigForm::from_config(&stored(), FormMode::Copy);
        assert_eq!(copy.name, "primary (副本)");
        assert!(!copy.update_api_key);
    }
}
