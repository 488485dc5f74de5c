/// Best-effort notification dispatch
///
/// After a primary write commits, the originating service hands an event to
/// the [`NotificationDispatcher`]. Delivery runs on a detached task: exactly
/// one attempt, no retry, no ordering. Failures are logged and counted and
/// never reach the originating request.

pub mod http;
pub mod local;

pub use http::HttpSink;
pub use local::LocalSink;

use crate::{
    error::MeshResult,
    metrics,
    store::{Blog, Comment, Priority, User},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Event handed to the notification service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<u64>,
}

impl NotificationEvent {
    pub fn blog_created(blog: &Blog) -> Self {
        Self {
            kind: "blog_created".to_string(),
            message: format!("New blog post: \"{}\" by {}", blog.title, blog.author),
            priority: None,
            user_id: None,
            blog_id: Some(blog.id),
            comment_id: None,
        }
    }

    pub fn comment_created(comment: &Comment) -> Self {
        Self {
            kind: "comment_created".to_string(),
            message: format!(
                "New comment by {} on blog {}",
                comment.author, comment.blog_id
            ),
            priority: None,
            user_id: None,
            blog_id: Some(comment.blog_id),
            comment_id: Some(comment.id),
        }
    }

    pub fn user_registered(user: &User) -> Self {
        Self {
            kind: "user_registered".to_string(),
            message: format!("New user registered: {} ({})", user.name, user.email),
            priority: None,
            user_id: Some(user.id),
            blog_id: None,
            comment_id: None,
        }
    }
}

/// Delivery backend
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &NotificationEvent) -> MeshResult<()>;
}

/// Fire-and-forget dispatcher owned by an originating service
#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    origin: &'static str,
}

impl NotificationDispatcher {
    /// `origin` names the emitting service in logs and metrics
    pub fn new(sink: Arc<dyn NotificationSink>, origin: &'static str) -> Self {
        Self { sink, origin }
    }

    /// Spawn one delivery attempt. Callers normally drop the handle.
    pub fn dispatch(&self, event: NotificationEvent) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let origin = self.origin;

        tokio::spawn(async move {
            match sink.deliver(&event).await {
                Ok(()) => {
                    debug!("{} notification delivered from {}", event.kind, origin);
                    metrics::record_dispatch(origin, true);
                }
                Err(e) => {
                    warn!(
                        "Failed to deliver {} notification from {}: {}",
                        event.kind, origin, e
                    );
                    metrics::record_dispatch(origin, false);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use chrono::Utc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<NotificationEvent>>,
    }

    #[async_trait]
    impl NotificationSink for Recorder {
        async fn deliver(&self, event: &NotificationEvent) -> MeshResult<()> {
            self.seen.lock().await.push(event.clone());
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl NotificationSink for Broken {
        async fn deliver(&self, _event: &NotificationEvent) -> MeshResult<()> {
            Err(MeshError::Dispatch("connection refused".to_string()))
        }
    }

    fn comment() -> Comment {
        Comment {
            id: 6,
            blog_id: 1,
            author: "Finn".to_string(),
            content: "Nice".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            likes: 0,
        }
    }

    #[test]
    fn test_event_messages() {
        let event = NotificationEvent::comment_created(&comment());
        assert_eq!(event.kind, "comment_created");
        assert_eq!(event.message, "New comment by Finn on blog 1");
        assert_eq!(event.comment_id, Some(6));
        assert_eq!(event.blog_id, Some(1));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "comment_created");
        assert_eq!(json["commentId"], 6);
        assert!(json.get("userId").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_delivers_once() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = NotificationDispatcher::new(recorder.clone(), "comment-service");

        dispatcher
            .dispatch(NotificationEvent::comment_created(&comment()))
            .await
            .unwrap();

        let seen = recorder.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, "comment_created");
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let dispatcher = NotificationDispatcher::new(Arc::new(Broken), "blog-service");
        let handle = dispatcher.dispatch(NotificationEvent::comment_created(&comment()));
        // The task completes normally even though delivery failed
        assert!(handle.await.is_ok());
    }
}
