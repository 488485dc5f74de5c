use crate::{config::NotificationsConfig, store::NotificationStore};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::info;

pub mod tasks;

/// Job scheduler for background tasks of the notification service
pub struct JobScheduler {
    store: Arc<NotificationStore>,
    settings: NotificationsConfig,
}

impl JobScheduler {
    pub fn new(store: Arc<NotificationStore>, settings: NotificationsConfig) -> Self {
        Self { store, settings }
    }

    /// Start all background jobs. A zero sweep interval disables the retention sweep.
    pub fn start(self: Arc<Self>) {
        if self.settings.sweep_interval_secs == 0 {
            info!("Retention sweep disabled");
            return;
        }

        info!("Starting background job scheduler");
        tokio::spawn(Self::retention_sweep_job(Arc::clone(&self)));
    }

    /// Delete notifications past the retention window (runs every sweep interval)
    async fn retention_sweep_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(scheduler.settings.sweep_interval_secs));

        loop {
            interval.tick().await;
            let count = tasks::purge_expired_notifications(
                &scheduler.store,
                scheduler.settings.retention_days,
            )
            .await;

            if count > 0 {
                info!(
                    "Retention sweep removed {} notifications older than {} days",
                    count, scheduler.settings.retention_days
                );
            }
        }
    }
}
