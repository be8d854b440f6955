//! Database migrations for the check-cx control plane
//!
//! Migrations are run in order on startup. Each migration is idempotent.

use sqlx::SqlitePool;
use tracing::info;

/// Run all migrations in order
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#
    )
    .execute(pool)
    .await?;

    let migrations: Vec<(&str, &str)> = vec![
        ("001_users", MIGRATION_001_USERS),
        ("002_check_configs", MIGRATION_002_CHECK_CONFIGS),
        ("003_group_info", MIGRATION_003_GROUP_INFO),
        ("004_system_notifications", MIGRATION_004_SYSTEM_NOTIFICATIONS),
    ];

    for (name, sql) in migrations {
        let applied: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM _migrations WHERE name = ?"
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        if applied.is_none() {
            info!("Applying migration: {}", name);

            // Statements are separated by semicolons
            for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
                sqlx::query(statement)
                    .execute(pool)
                    .await?;
            }

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await?;

            info!("Migration {} applied successfully", name);
        }
    }

    Ok(())
}

/// Migration 001: console users
const MIGRATION_001_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE,
    email TEXT UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    last_login TEXT
)
"#;

/// Migration 002: check configs
const MIGRATION_002_CHECK_CONFIGS: &str = r#"
CREATE TABLE IF NOT EXISTS check_configs (
    id TEXT PRIMARY KEY,
    name TEXT,
    type TEXT,
    model TEXT,
    endpoint TEXT,
    api_key TEXT,                              -- write-only, never returned by the API
    enabled INTEGER,
    is_maintenance INTEGER,
    request_header TEXT,                       -- JSON object of string values
    metadata TEXT,                             -- JSON object
    group_name TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_check_configs_group ON check_configs(group_name);
CREATE INDEX IF NOT EXISTS idx_check_configs_created ON check_configs(created_at)
"#;

/// Migration 003: group info
const MIGRATION_003_GROUP_INFO: &str = r#"
CREATE TABLE IF NOT EXISTS group_info (
    id TEXT PRIMARY KEY,
    group_name TEXT NOT NULL UNIQUE,
    website_url TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT
)
"#;

/// Migration 004: system notification banners
const MIGRATION_004_SYSTEM_NOTIFICATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS system_notifications (
    id TEXT PRIMARY KEY,
    message TEXT NOT NULL,
    level TEXT NOT NULL DEFAULT 'info',        -- info, warning, error
    is_active INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_system_notifications_active ON system_notifications(is_active)
"#;
