/// Background task implementations
use crate::{metrics, store::NotificationStore};
use chrono::Utc;

/// Delete notifications older than the retention window, returning how many were removed
pub async fn purge_expired_notifications(store: &NotificationStore, retention_days: u32) -> usize {
    let count = store.cleanup(retention_days, Utc::now()).await;
    metrics::record_notifications_purged(count);
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_purge_keeps_recent_notifications() {
        let store = NotificationStore::seeded();
        assert_eq!(purge_expired_notifications(&store, 30).await, 0);
        assert_eq!(store.len().await, 3);
    }
}
