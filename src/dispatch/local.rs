/// Notification delivery into an in-process store
use super::{NotificationEvent, NotificationSink};
use crate::{
    error::MeshResult,
    store::{NewNotification, NotificationStore},
};
use async_trait::async_trait;
use std::sync::Arc;

pub struct LocalSink {
    store: Arc<NotificationStore>,
}

impl LocalSink {
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self { store }
    }
}

impl From<&NotificationEvent> for NewNotification {
    fn from(event: &NotificationEvent) -> Self {
        NewNotification {
            kind: Some(event.kind.clone()),
            message: Some(event.message.clone()),
            priority: event.priority.map(|p| p.as_str().to_string()),
            user_id: event.user_id,
            blog_id: event.blog_id,
            comment_id: event.comment_id,
        }
    }
}

#[async_trait]
impl NotificationSink for LocalSink {
    async fn deliver(&self, event: &NotificationEvent) -> MeshResult<()> {
        self.store.create(NewNotification::from(event)).await?;
        Ok(())
    }
}
