//! CLI subcommands for check-cx management
//!
//! Provides commands for managing:
//! - Check configs (list, enable, disable, delete)
//! - Groups (list, create, delete)
//! - System notifications (list)

use checkcx_shared::{
    ConfigListResponse, GroupInfo, GroupInput, SetEnabledRequest, SystemNotification,
    EMPTY_VALUE,
};
use clap::Subcommand;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

/// Base URL for API calls
fn get_api_url(url: &str) -> String {
    format!("{}/api/v1", url.trim_end_matches('/'))
}

/// CLI client for the check-cx control plane
pub struct CliClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl CliClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: get_api_url(base_url),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.put(format!("{}{}", self.base_url, path)))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.delete(format!("{}{}", self.base_url, path)))
    }
}

/// Print the server's error message; returns `None` for failed responses
async fn success(resp: Response) -> anyhow::Result<Option<Response>> {
    if resp.status().is_success() {
        return Ok(Some(resp));
    }
    let status = resp.status();
    let error: Value = resp.json().await.unwrap_or(Value::Null);
    eprintln!(
        "Error ({}): {}",
        status.as_u16(),
        error["error"].as_str().unwrap_or("Unknown error")
    );
    Ok(None)
}

fn cell(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(EMPTY_VALUE)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

// =============================================================================
// Config Commands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// List check configs
    List {
        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
        /// Search name, type, model, endpoint and group
        #[arg(short, long)]
        q: Option<String>,
        /// Group name, or __ungrouped__
        #[arg(short, long)]
        group: Option<String>,
        /// Page number (20 configs per page)
        #[arg(short, long, default_value = "1")]
        page: i64,
    },
    /// Switch a config on
    Enable {
        /// Config ID
        id: String,
    },
    /// Switch a config off
    Disable {
        /// Config ID
        id: String,
    },
    /// Delete a check config
    Delete {
        /// Config ID
        id: String,
        /// Force deletion without confirmation
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommands {
    pub async fn execute(&self, client: &CliClient) -> anyhow::Result<()> {
        match self {
            ConfigCommands::List { format, q, group, page } => {
                let mut query: Vec<(&str, String)> = vec![("page", page.to_string())];
                if let Some(q) = q {
                    query.push(("q", q.clone()));
                }
                if let Some(group) = group {
                    query.push(("group", group.clone()));
                }

                let resp = client.get("/configs").query(&query).send().await?;
                let Some(resp) = success(resp).await? else {
                    return Ok(());
                };
                let list: ConfigListResponse = resp.json().await?;

                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&list)?);
                } else {
                    println!("{:<36} {:<20} {:<12} {:<20} {:<8} {:<8} {:<12}",
                        "ID", "NAME", "TYPE", "MODEL", "ENABLED", "MAINT", "GROUP");
                    println!("{}", "-".repeat(120));
                    for config in &list.rows {
                        println!("{:<36} {:<20} {:<12} {:<20} {:<8} {:<8} {:<12}",
                            config.id,
                            cell(config.name.as_deref()),
                            cell(config.provider_type.as_deref()),
                            cell(config.model.as_deref()),
                            yes_no(config.is_enabled()),
                            yes_no(config.in_maintenance()),
                            cell(config.group_name.as_deref()),
                        );
                    }
                    let pages = ((list.total + list.per_page - 1) / list.per_page).max(1);
                    println!();
                    println!("Page {}/{} ({} configs)", list.page, pages, list.total);
                }
                Ok(())
            }
            ConfigCommands::Enable { id } | ConfigCommands::Disable { id } => {
                let enabled = matches!(self, ConfigCommands::Enable { .. });
                let resp = client
                    .put(&format!("/configs/{}/enabled", id))
                    .json(&SetEnabledRequest { enabled })
                    .send()
                    .await?;

                if success(resp).await?.is_some() {
                    println!("Config {} {}.", id, if enabled { "enabled" } else { "disabled" });
                }
                Ok(())
            }
            ConfigCommands::Delete { id, force } => {
                if !force {
                    println!("Are you sure you want to delete config {}? Use --force to confirm.", id);
                    return Ok(());
                }

                let resp = client.delete(&format!("/configs/{}", id)).send().await?;
                if success(resp).await?.is_some() {
                    println!("Config {} deleted successfully.", id);
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Group Commands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// List all groups
    List {
        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// Create a new group
    Create {
        /// Group name
        #[arg(short, long)]
        name: String,
        /// Website shown for the group
        #[arg(short, long)]
        website_url: String,
    },
    /// Delete a group (its configs keep their group name)
    Delete {
        /// Group ID
        id: String,
        /// Force deletion without confirmation
        #[arg(short, long)]
        force: bool,
    },
}

impl GroupCommands {
    pub async fn execute(&self, client: &CliClient) -> anyhow::Result<()> {
        match self {
            GroupCommands::List { format } => {
                let resp = client.get("/groups").send().await?;
                let Some(resp) = success(resp).await? else {
                    return Ok(());
                };
                let groups: Vec<GroupInfo> = resp.json().await?;

                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&groups)?);
                } else {
                    println!("{:<36} {:<24} {:<36} {:<8}", "ID", "NAME", "WEBSITE", "CONFIGS");
                    println!("{}", "-".repeat(106));
                    for group in groups {
                        println!("{:<36} {:<24} {:<36} {:<8}",
                            group.id,
                            group.group_name,
                            cell(group.website_url.as_deref()),
                            group.config_count.map(|n| n.to_string()).unwrap_or_else(|| EMPTY_VALUE.to_string()),
                        );
                    }
                }
                Ok(())
            }
            GroupCommands::Create { name, website_url } => {
                let body = GroupInput {
                    group_name: name.clone(),
                    website_url: website_url.clone(),
                };

                let resp = client.post("/groups").json(&body).send().await?;
                if let Some(resp) = success(resp).await? {
                    let group: GroupInfo = resp.json().await?;
                    println!("Group created successfully!");
                    println!("ID: {}", group.id);
                }
                Ok(())
            }
            GroupCommands::Delete { id, force } => {
                if !force {
                    println!("Are you sure you want to delete group {}? Use --force to confirm.", id);
                    return Ok(());
                }

                let resp = client.delete(&format!("/groups/{}", id)).send().await?;
                if success(resp).await?.is_some() {
                    println!("Group {} deleted successfully.", id);
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Notification Commands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List system notifications
    List {
        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

impl NotificationCommands {
    pub async fn execute(&self, client: &CliClient) -> anyhow::Result<()> {
        match self {
            NotificationCommands::List { format } => {
                let resp = client.get("/notifications").send().await?;
                let Some(resp) = success(resp).await? else {
                    return Ok(());
                };
                let notifications: Vec<SystemNotification> = resp.json().await?;

                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&notifications)?);
                } else {
                    println!("{:<36} {:<8} {:<7} {:<50}", "ID", "LEVEL", "ACTIVE", "MESSAGE");
                    println!("{}", "-".repeat(104));
                    for n in notifications {
                        let message: String = n.message.chars().take(50).collect();
                        println!("{:<36} {:<8} {:<7} {:<50}",
                            n.id,
                            n.level.as_str(),
                            yes_no(n.is_active),
                            message,
                        );
                    }
                }
                Ok(())
            }
        }
    }
}
