//! Dashboard summary endpoint
//!
//! Every count is read independently. A failing count is reported as
//! `null` instead of failing the whole summary.

use axum::{extract::State, Json};
use checkcx_shared::{DashboardSummary, GroupConfigCount};
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use crate::db::repository::{CheckConfigRepository, GroupInfoRepository, NotificationRepository};
use crate::AppState;

/// Number of groups listed on the dashboard
pub const DASHBOARD_GROUP_LIMIT: i64 = 8;

async fn safe_count<F>(what: &str, count: F) -> Option<i64>
where
    F: Future<Output = Result<i64, sqlx::Error>>,
{
    match count.await {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("Dashboard count '{}' failed: {}", what, e);
            None
        }
    }
}

/// Groups not shown on the dashboard; unknown unless both the total and the listing loaded
fn groups_remaining(total: Option<i64>, listed: Option<usize>) -> Option<i64> {
    let total = total?;
    let listed = i64::try_from(listed?).unwrap_or(i64::MAX);
    Some((total - listed).max(0))
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSummary> {
    let pool = state.db.pool();

    let (total_configs, enabled_configs, maintenance_configs, disabled_configs) = tokio::join!(
        safe_count("total_configs", CheckConfigRepository::count(pool)),
        safe_count("enabled_configs", CheckConfigRepository::count_enabled(pool)),
        safe_count("maintenance_configs", CheckConfigRepository::count_maintenance(pool)),
        safe_count("disabled_configs", CheckConfigRepository::count_disabled(pool)),
    );
    let (total_groups, total_notifications, active_notifications) = tokio::join!(
        safe_count("total_groups", GroupInfoRepository::count(pool)),
        safe_count("total_notifications", NotificationRepository::count(pool)),
        safe_count("active_notifications", NotificationRepository::count_active(pool)),
    );

    let groups = match GroupInfoRepository::list_by_name(pool, DASHBOARD_GROUP_LIMIT).await {
        Ok(rows) => Some(
            rows.into_iter()
                .map(|row| GroupConfigCount {
                    id: row.id,
                    name: row.group_name,
                    config_count: Some(row.config_count),
                })
                .collect::<Vec<_>>(),
        ),
        Err(e) => {
            warn!("Dashboard group list failed: {}", e);
            None
        }
    };

    let groups_remaining = groups_remaining(total_groups, groups.as_ref().map(Vec::len));

    Json(DashboardSummary {
        total_configs,
        enabled_configs,
        maintenance_configs,
        disabled_configs,
        total_groups,
        total_notifications,
        active_notifications,
        groups,
        groups_remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_remaining_needs_both_counts() {
        assert_eq!(groups_remaining(Some(10), Some(8)), Some(2));
        assert_eq!(groups_remaining(Some(3), Some(3)), Some(0));
        assert_eq!(groups_remaining(None, Some(8)), None);
        assert_eq!(groups_remaining(Some(10), None), None);
    }
}
