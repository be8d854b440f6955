//! Database module for the check-cx control plane
//!
//! Uses SQLite for storing:
//! - Console users
//! - Check configs
//! - Groups
//! - System notifications

pub mod migrations;
pub mod models;
pub mod repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    ///
    /// If the database file doesn't exist, it will be created.
    /// Migrations are run automatically on startup.
    pub async fn new(db_path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                sqlx::Error::Configuration(format!("Failed to create database directory: {}", e).into())
            })?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        info!("Connecting to database: {}", db_path.display());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };

        info!("Running database migrations...");
        migrations::run_migrations(&db.pool).await?;

        info!("Database initialized successfully");
        Ok(db)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if this is a fresh database (no users exist)
    pub async fn is_fresh(&self) -> Result<bool, sqlx::Error> {
        Ok(repository::UserRepository::count(&self.pool).await? == 0)
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::models::CheckConfigWrite;
    use super::repository::*;
    use super::*;
    use tempfile::tempdir;

    async fn create_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::new(&db_path).await.unwrap();
        (db, dir)
    }

    fn config(name: &str, group: Option<&str>) -> CheckConfigWrite {
        CheckConfigWrite {
            name: name.to_string(),
            provider_type: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: Some("sk-test".to_string()),
            enabled: true,
            is_maintenance: false,
            request_header: None,
            metadata: None,
            group_name: group.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_database_creation() {
        let (db, _dir) = create_test_db().await;

        assert!(db.is_fresh().await.unwrap());

        let applied: Vec<(String,)> = sqlx::query_as("SELECT name FROM _migrations ORDER BY id")
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(applied.len(), 4);

        db.close().await;
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let db = Database::new(&db_path).await.unwrap();
        UserRepository::create(db.pool(), "admin", "admin@example.com", "hash").await.unwrap();
        db.close().await;

        let db = Database::new(&db_path).await.unwrap();
        assert!(!db.is_fresh().await.unwrap());
        db.close().await;
    }

    // =========================================================================
    // Check Config Repository Tests
    // =========================================================================

    #[tokio::test]
    async fn test_check_config_create_and_update() {
        let (db, _dir) = create_test_db().await;

        let created = CheckConfigRepository::create(db.pool(), &config("primary", None))
            .await
            .unwrap();
        assert_eq!(created.name.as_deref(), Some("primary"));
        assert_eq!(created.api_key.as_deref(), Some("sk-test"));
        assert_eq!(created.enabled, Some(true));

        // no api key keeps the stored one
        let mut changes = config("renamed", Some("prod"));
        changes.api_key = None;
        let updated = CheckConfigRepository::update(db.pool(), &created.id, &changes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("renamed"));
        assert_eq!(updated.group_name.as_deref(), Some("prod"));
        assert_eq!(updated.api_key.as_deref(), Some("sk-test"));

        changes.api_key = Some("sk-new".to_string());
        let updated = CheckConfigRepository::update(db.pool(), &created.id, &changes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.api_key.as_deref(), Some("sk-new"));

        let missing = CheckConfigRepository::update(db.pool(), "nonexistent", &changes)
            .await
            .unwrap();
        assert!(missing.is_none());

        db.close().await;
    }

    #[tokio::test]
    async fn test_check_config_filters() {
        let (db, _dir) = create_test_db().await;

        CheckConfigRepository::create(db.pool(), &config("Alpha OpenAI", Some("prod"))).await.unwrap();
        CheckConfigRepository::create(db.pool(), &config("beta", Some("staging"))).await.unwrap();
        CheckConfigRepository::create(db.pool(), &config("gamma", None)).await.unwrap();

        let (rows, total) = CheckConfigRepository::list(db.pool(), &ConfigFilter::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 3);
        // newest first
        assert_eq!(rows[0].name.as_deref(), Some("gamma"));

        let filter = ConfigFilter {
            search: None,
            group: GroupFilter::Ungrouped,
        };
        let (rows, total) = CheckConfigRepository::list(db.pool(), &filter, 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].name.as_deref(), Some("gamma"));

        let filter = ConfigFilter {
            search: None,
            group: GroupFilter::Named("prod".to_string()),
        };
        let (_, total) = CheckConfigRepository::list(db.pool(), &filter, 20, 0).await.unwrap();
        assert_eq!(total, 1);

        let filter = ConfigFilter {
            search: Some("ALPHA".to_string()),
            group: GroupFilter::All,
        };
        let (rows, total) = CheckConfigRepository::list(db.pool(), &filter, 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].name.as_deref(), Some("Alpha OpenAI"));

        // search also covers group_name
        let filter = ConfigFilter {
            search: Some("stag".to_string()),
            group: GroupFilter::All,
        };
        let (_, total) = CheckConfigRepository::list(db.pool(), &filter, 20, 0).await.unwrap();
        assert_eq!(total, 1);

        db.close().await;
    }

    #[tokio::test]
    async fn test_check_config_pagination() {
        let (db, _dir) = create_test_db().await;

        for i in 0..25 {
            CheckConfigRepository::create(db.pool(), &config(&format!("config-{:02}", i), None))
                .await
                .unwrap();
        }

        let (first, total) = CheckConfigRepository::list(db.pool(), &ConfigFilter::default(), 20, 0)
            .await
            .unwrap();
        let (second, _) = CheckConfigRepository::list(db.pool(), &ConfigFilter::default(), 20, 20)
            .await
            .unwrap();
        assert_eq!(total, 25);
        assert_eq!(first.len(), 20);
        assert_eq!(second.len(), 5);
        assert_eq!(second[4].name.as_deref(), Some("config-00"));

        db.close().await;
    }

    #[tokio::test]
    async fn test_check_config_flags_and_counts() {
        let (db, _dir) = create_test_db().await;

        let a = CheckConfigRepository::create(db.pool(), &config("a", None)).await.unwrap();
        let b = CheckConfigRepository::create(db.pool(), &config("b", None)).await.unwrap();
        CheckConfigRepository::create(db.pool(), &config("c", None)).await.unwrap();

        assert!(CheckConfigRepository::set_enabled(db.pool(), &a.id, false).await.unwrap());
        assert!(CheckConfigRepository::set_maintenance(db.pool(), &b.id, true).await.unwrap());
        assert!(!CheckConfigRepository::set_enabled(db.pool(), "nonexistent", true).await.unwrap());

        sqlx::query("UPDATE check_configs SET enabled = NULL WHERE id = ?")
            .bind(&b.id)
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(CheckConfigRepository::count(db.pool()).await.unwrap(), 3);
        assert_eq!(CheckConfigRepository::count_enabled(db.pool()).await.unwrap(), 1);
        assert_eq!(CheckConfigRepository::count_disabled(db.pool()).await.unwrap(), 2);
        assert_eq!(CheckConfigRepository::count_maintenance(db.pool()).await.unwrap(), 1);

        assert!(CheckConfigRepository::delete(db.pool(), &a.id).await.unwrap());
        assert!(!CheckConfigRepository::delete(db.pool(), &a.id).await.unwrap());

        db.close().await;
    }

    // =========================================================================
    // Group Repository Tests
    // =========================================================================

    #[tokio::test]
    async fn test_group_config_counts() {
        let (db, _dir) = create_test_db().await;

        let prod = GroupInfoRepository::create(db.pool(), "prod", "https://prod.example.com")
            .await
            .unwrap();
        GroupInfoRepository::create(db.pool(), "staging", "https://staging.example.com")
            .await
            .unwrap();
        assert_eq!(prod.config_count, 0);

        CheckConfigRepository::create(db.pool(), &config("a", Some("prod"))).await.unwrap();
        CheckConfigRepository::create(db.pool(), &config("b", Some("prod"))).await.unwrap();

        let groups = GroupInfoRepository::list(db.pool()).await.unwrap();
        assert_eq!(groups.len(), 2);
        let prod = groups.iter().find(|g| g.group_name == "prod").unwrap();
        assert_eq!(prod.config_count, 2);

        let by_name = GroupInfoRepository::list_by_name(db.pool(), 1).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].group_name, "prod");

        let names = GroupInfoRepository::list_names(db.pool()).await.unwrap();
        assert_eq!(names, vec!["prod".to_string(), "staging".to_string()]);

        db.close().await;
    }

    #[tokio::test]
    async fn test_group_name_unique() {
        let (db, _dir) = create_test_db().await;

        GroupInfoRepository::create(db.pool(), "prod", "https://a.example.com").await.unwrap();
        let err = GroupInfoRepository::create(db.pool(), "prod", "https://b.example.com")
            .await
            .unwrap_err();
        let is_unique = err
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);
        assert!(is_unique);

        db.close().await;
    }

    #[tokio::test]
    async fn test_group_update_and_delete() {
        let (db, _dir) = create_test_db().await;

        let group = GroupInfoRepository::create(db.pool(), "prod", "https://a.example.com")
            .await
            .unwrap();
        assert!(group.updated_at.is_none());

        let updated = GroupInfoRepository::update(db.pool(), &group.id, "production", "https://b.example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.group_name, "production");
        assert!(updated.updated_at.is_some());

        assert!(GroupInfoRepository::update(db.pool(), "nonexistent", "x", "https://c.example.com")
            .await
            .unwrap()
            .is_none());

        assert!(GroupInfoRepository::delete(db.pool(), &group.id).await.unwrap());
        assert_eq!(GroupInfoRepository::count(db.pool()).await.unwrap(), 0);

        db.close().await;
    }

    // =========================================================================
    // Notification Repository Tests
    // =========================================================================

    #[tokio::test]
    async fn test_notifications() {
        let (db, _dir) = create_test_db().await;

        let n = NotificationRepository::create(db.pool(), "maintenance tonight", "warning", false)
            .await
            .unwrap();
        NotificationRepository::create(db.pool(), "all good", "info", true).await.unwrap();

        assert_eq!(NotificationRepository::count(db.pool()).await.unwrap(), 2);
        assert_eq!(NotificationRepository::count_active(db.pool()).await.unwrap(), 1);

        let activated = NotificationRepository::set_active(db.pool(), &n.id, true)
            .await
            .unwrap()
            .unwrap();
        assert!(activated.is_active);
        assert_eq!(NotificationRepository::count_active(db.pool()).await.unwrap(), 2);

        let updated = NotificationRepository::update(db.pool(), &n.id, "moved", "error", false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.message, "moved");
        assert_eq!(updated.level, "error");

        let listed = NotificationRepository::list(db.pool()).await.unwrap();
        assert_eq!(listed[0].message, "all good");

        assert!(NotificationRepository::delete(db.pool(), &n.id).await.unwrap());

        db.close().await;
    }

    // =========================================================================
    // User Repository Tests
    // =========================================================================

    #[tokio::test]
    async fn test_user_lookup() {
        let (db, _dir) = create_test_db().await;

        let user = UserRepository::create(db.pool(), "admin", "admin@example.com", "hash")
            .await
            .unwrap();
        assert!(user.last_login.is_none());

        assert!(UserRepository::get_by_username(db.pool(), "admin").await.unwrap().is_some());
        assert!(UserRepository::get_by_email(db.pool(), "admin@example.com").await.unwrap().is_some());
        assert!(UserRepository::get_by_username(db.pool(), "nobody").await.unwrap().is_none());

        UserRepository::update_last_login(db.pool(), &user.id).await.unwrap();
        let reloaded = UserRepository::get_by_id(db.pool(), &user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login.is_some());

        db.close().await;
    }
}
