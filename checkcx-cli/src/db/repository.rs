//! Database repository implementations
//!
//! Provides CRUD operations for all database models.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::models::*;

// =============================================================================
// Check Config Repository
// =============================================================================

/// Which groups a config listing covers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupFilter {
    #[default]
    All,
    /// Configs without a group
    Ungrouped,
    Named(String),
}

/// Filter for listing check configs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFilter {
    /// Case-insensitive substring, already sanitized
    pub search: Option<String>,
    pub group: GroupFilter,
}

const SEARCH_COLUMNS: [&str; 5] = ["name", "type", "model", "endpoint", "group_name"];

fn push_config_filter(qb: &mut QueryBuilder<'static, Sqlite>, filter: &ConfigFilter) {
    qb.push(" WHERE 1 = 1");

    match &filter.group {
        GroupFilter::All => {}
        GroupFilter::Ungrouped => {
            qb.push(" AND group_name IS NULL");
        }
        GroupFilter::Named(name) => {
            qb.push(" AND group_name = ").push_bind(name.clone());
        }
    }

    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", term.to_lowercase());
        qb.push(" AND (");
        for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("LOWER(COALESCE({}, '')) LIKE ", column))
                .push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

pub struct CheckConfigRepository;

impl CheckConfigRepository {
    /// List one page of configs, newest first, with the total matching count
    pub async fn list(
        pool: &SqlitePool,
        filter: &ConfigFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CheckConfigRow>, i64), sqlx::Error> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM check_configs");
        push_config_filter(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM check_configs");
        push_config_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = query.build_query_as::<CheckConfigRow>().fetch_all(pool).await?;

        Ok((rows, total))
    }

    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<CheckConfigRow>, sqlx::Error> {
        sqlx::query_as::<_, CheckConfigRow>("SELECT * FROM check_configs WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new check config
    pub async fn create(pool: &SqlitePool, config: &CheckConfigWrite) -> Result<CheckConfigRow, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, CheckConfigRow>(
            r#"
            INSERT INTO check_configs (
                id, name, type, model, endpoint, api_key, enabled, is_maintenance,
                request_header, metadata, group_name, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, datetime('now'))
            RETURNING *
            "#
        )
        .bind(&id)
        .bind(&config.name)
        .bind(&config.provider_type)
        .bind(&config.model)
        .bind(&config.endpoint)
        .bind(&config.api_key)
        .bind(config.enabled)
        .bind(config.is_maintenance)
        .bind(&config.request_header)
        .bind(&config.metadata)
        .bind(&config.group_name)
        .fetch_one(pool)
        .await
    }

    /// Update a check config; a `None` api key keeps the stored one
    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        config: &CheckConfigWrite,
    ) -> Result<Option<CheckConfigRow>, sqlx::Error> {
        sqlx::query_as::<_, CheckConfigRow>(
            r#"
            UPDATE check_configs SET
                name = ?,
                type = ?,
                model = ?,
                endpoint = ?,
                api_key = COALESCE(?, api_key),
                enabled = ?,
                is_maintenance = ?,
                request_header = ?,
                metadata = ?,
                group_name = ?,
                updated_at = datetime('now')
            WHERE id = ?
            RETURNING *
            "#
        )
        .bind(&config.name)
        .bind(&config.provider_type)
        .bind(&config.model)
        .bind(&config.endpoint)
        .bind(&config.api_key)
        .bind(config.enabled)
        .bind(config.is_maintenance)
        .bind(&config.request_header)
        .bind(&config.metadata)
        .bind(&config.group_name)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_enabled(pool: &SqlitePool, id: &str, enabled: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE check_configs SET enabled = ?, updated_at = datetime('now') WHERE id = ?"
        )
        .bind(enabled)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_maintenance(pool: &SqlitePool, id: &str, is_maintenance: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE check_configs SET is_maintenance = ?, updated_at = datetime('now') WHERE id = ?"
        )
        .bind(is_maintenance)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM check_configs WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM check_configs")
            .fetch_one(pool)
            .await
    }

    pub async fn count_enabled(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM check_configs WHERE enabled = 1")
            .fetch_one(pool)
            .await
    }

    pub async fn count_maintenance(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM check_configs WHERE is_maintenance = 1")
            .fetch_one(pool)
            .await
    }

    /// Configs switched off, including those that never had the flag set
    pub async fn count_disabled(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM check_configs WHERE enabled = 0 OR enabled IS NULL")
            .fetch_one(pool)
            .await
    }
}

// =============================================================================
// Group Repository
// =============================================================================

const GROUP_SELECT: &str = r#"
    SELECT g.id, g.group_name, g.website_url, g.created_at, g.updated_at,
           (SELECT COUNT(*) FROM check_configs c WHERE c.group_name = g.group_name) AS config_count
    FROM group_info g
"#;

pub struct GroupInfoRepository;

impl GroupInfoRepository {
    /// Create a new group
    pub async fn create(
        pool: &SqlitePool,
        group_name: &str,
        website_url: &str,
    ) -> Result<GroupInfoRow, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO group_info (id, group_name, website_url)
            VALUES (?, ?, ?)
            "#
        )
        .bind(&id)
        .bind(group_name)
        .bind(website_url)
        .execute(pool)
        .await?;

        Self::get_by_id(pool, &id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<GroupInfoRow>, sqlx::Error> {
        sqlx::query_as::<_, GroupInfoRow>(&format!("{} WHERE g.id = ?", GROUP_SELECT))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn get_by_name(pool: &SqlitePool, group_name: &str) -> Result<Option<GroupInfoRow>, sqlx::Error> {
        sqlx::query_as::<_, GroupInfoRow>(&format!("{} WHERE g.group_name = ?", GROUP_SELECT))
            .bind(group_name)
            .fetch_optional(pool)
            .await
    }

    /// List all groups, newest first
    pub async fn list(pool: &SqlitePool) -> Result<Vec<GroupInfoRow>, sqlx::Error> {
        sqlx::query_as::<_, GroupInfoRow>(&format!(
            "{} ORDER BY g.created_at DESC, g.rowid DESC",
            GROUP_SELECT
        ))
        .fetch_all(pool)
        .await
    }

    /// First `limit` groups ordered by name
    pub async fn list_by_name(pool: &SqlitePool, limit: i64) -> Result<Vec<GroupInfoRow>, sqlx::Error> {
        sqlx::query_as::<_, GroupInfoRow>(&format!("{} ORDER BY g.group_name ASC LIMIT ?", GROUP_SELECT))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Sorted distinct non-blank group names
    pub async fn list_names(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT group_name FROM group_info WHERE TRIM(group_name) <> '' ORDER BY group_name"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        group_name: &str,
        website_url: &str,
    ) -> Result<Option<GroupInfoRow>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE group_info
            SET group_name = ?, website_url = ?, updated_at = datetime('now')
            WHERE id = ?
            "#
        )
        .bind(group_name)
        .bind(website_url)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::get_by_id(pool, id).await
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM group_info WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM group_info")
            .fetch_one(pool)
            .await
    }
}

// =============================================================================
// Notification Repository
// =============================================================================

pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn create(
        pool: &SqlitePool,
        message: &str,
        level: &str,
        is_active: bool,
    ) -> Result<NotificationRow, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO system_notifications (id, message, level, is_active)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#
        )
        .bind(&id)
        .bind(message)
        .bind(level)
        .bind(is_active)
        .fetch_one(pool)
        .await
    }

    /// List all notifications, newest first
    pub async fn list(pool: &SqlitePool) -> Result<Vec<NotificationRow>, sqlx::Error> {
        sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM system_notifications ORDER BY created_at DESC, rowid DESC"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        message: &str,
        level: &str,
        is_active: bool,
    ) -> Result<Option<NotificationRow>, sqlx::Error> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE system_notifications
            SET message = ?, level = ?, is_active = ?, updated_at = datetime('now')
            WHERE id = ?
            RETURNING *
            "#
        )
        .bind(message)
        .bind(level)
        .bind(is_active)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_active(
        pool: &SqlitePool,
        id: &str,
        is_active: bool,
    ) -> Result<Option<NotificationRow>, sqlx::Error> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE system_notifications
            SET is_active = ?, updated_at = datetime('now')
            WHERE id = ?
            RETURNING *
            "#
        )
        .bind(is_active)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM system_notifications WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM system_notifications")
            .fetch_one(pool)
            .await
    }

    pub async fn count_active(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM system_notifications WHERE is_active = 1")
            .fetch_one(pool)
            .await
    }
}

// =============================================================================
// User Repository
// =============================================================================

pub struct UserRepository;

impl UserRepository {
    /// Create a new user
    pub async fn create(
        pool: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#
        )
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn get_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Update last login
    pub async fn update_last_login(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}
