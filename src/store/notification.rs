/// Notification store
use crate::{
    error::{MeshError, MeshResult},
    stats::NotificationStats,
    store::{lenient_id, provided, Record, RecordStore},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Notification priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = MeshError;

    fn from_str(s: &str) -> MeshResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(MeshError::Validation(format!("Invalid priority: {}", s))),
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Notification record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<bool>,
}

impl Record for Notification {
    const KIND: &'static str = "Notification";

    fn id(&self) -> u64 {
        self.id
    }
}

/// Create notification request (`POST /notify`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(rename = "type")]
    #[validate(
        required(message = "type is required"),
        length(min = 1, message = "type is required")
    )]
    pub kind: Option<String>,
    #[validate(
        required(message = "message is required"),
        length(min = 1, message = "message is required")
    )]
    pub message: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub blog_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<u64>,
}

/// Broadcast request: only `message` is required
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewBroadcast {
    #[validate(
        required(message = "message is required"),
        length(min = 1, message = "message is required")
    )]
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub priority: Option<String>,
}

/// Equality filter over notifications. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub kind: Option<String>,
    pub read: Option<bool>,
    pub priority: Option<Priority>,
    pub user_id: Option<u64>,
}

impl NotificationFilter {
    pub fn matches(&self, n: &Notification) -> bool {
        self.kind.as_deref().map_or(true, |k| n.kind == k)
            && self.read.map_or(true, |r| n.read == r)
            && self.priority.map_or(true, |p| n.priority == p)
            && self.user_id.map_or(true, |u| n.user_id == Some(u))
    }
}

fn parse_priority(raw: Option<String>) -> MeshResult<Priority> {
    provided(raw)
        .map(|p| p.parse::<Priority>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Notification store
pub struct NotificationStore {
    records: RecordStore<Notification>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            records: RecordStore::new(),
        }
    }

    /// Create a store holding the sample notifications
    pub fn seeded() -> Self {
        Self::with_records(seed(Utc::now()))
    }

    pub fn with_records(notifications: Vec<Notification>) -> Self {
        Self {
            records: RecordStore::with_records(notifications),
        }
    }

    /// Record a new unread notification
    pub async fn create(&self, req: NewNotification) -> MeshResult<Notification> {
        req.validate()?;
        let priority = parse_priority(req.priority)?;
        let now = Utc::now();

        self.records
            .insert(|id, _| {
                Ok(Notification {
                    id,
                    kind: req.kind.unwrap_or_default(),
                    message: req.message.unwrap_or_default(),
                    timestamp: now,
                    read: false,
                    priority,
                    read_at: None,
                    user_id: req.user_id,
                    blog_id: req.blog_id,
                    comment_id: req.comment_id,
                    broadcast: None,
                })
            })
            .await
    }

    /// Record a broadcast notification addressed to every user
    pub async fn broadcast(&self, req: NewBroadcast) -> MeshResult<Notification> {
        req.validate()?;
        let priority = parse_priority(req.priority)?;
        let kind = provided(req.kind).unwrap_or_else(|| "broadcast".to_string());
        let now = Utc::now();

        self.records
            .insert(|id, _| {
                Ok(Notification {
                    id,
                    kind,
                    message: req.message.unwrap_or_default(),
                    timestamp: now,
                    read: false,
                    priority,
                    read_at: None,
                    user_id: None,
                    blog_id: None,
                    comment_id: None,
                    broadcast: Some(true),
                })
            })
            .await
    }

    pub async fn get(&self, id: u64) -> MeshResult<Notification> {
        self.records.get(id).await
    }

    pub async fn len(&self) -> usize {
        self.records.len().await
    }

    pub async fn list_all(&self) -> Vec<Notification> {
        self.records.list().await
    }

    /// Filtered listing, newest first, capped at `limit`.
    /// Records with equal timestamps keep insertion order.
    pub async fn list(&self, filter: &NotificationFilter, limit: usize) -> Vec<Notification> {
        let mut matching = self.records.list_where(|n| filter.matches(n)).await;
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        matching
    }

    /// Mark one notification read. Reading is irreversible and the first
    /// `readAt` stamp is kept.
    pub async fn mark_read(&self, id: u64) -> MeshResult<Notification> {
        self.records
            .update(id, |n, _| {
                if !n.read {
                    n.read = true;
                    n.read_at = Some(Utc::now());
                }
                Ok(())
            })
            .await
    }

    /// Mark every unread notification matching `filter` read, returning how many flipped
    pub async fn mark_all_read(&self, filter: &NotificationFilter) -> usize {
        let now = Utc::now();
        self.records
            .update_where(
                |n| !n.read && filter.matches(n),
                |n| {
                    n.read = true;
                    n.read_at = Some(now);
                },
            )
            .await
    }

    pub async fn delete(&self, id: u64) -> MeshResult<Notification> {
        self.records.remove(id).await
    }

    /// Delete notifications that are `older_than_days` days old or older.
    /// A cutoff before the earliest representable date matches nothing.
    pub async fn cleanup(&self, older_than_days: u32, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = Duration::try_days(i64::from(older_than_days))
            .and_then(|age| now.checked_sub_signed(age))
        else {
            return 0;
        };
        self.records.remove_where(|n| n.timestamp <= cutoff).await
    }

    pub async fn unread_count(&self, user_id: Option<u64>, kind: Option<String>) -> usize {
        let filter = NotificationFilter {
            kind,
            read: Some(false),
            priority: None,
            user_id,
        };
        self.records.count_where(|n| filter.matches(n)).await
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> NotificationStats {
        NotificationStats::from_records(&self.records.list().await, now)
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn seed(now: DateTime<Utc>) -> Vec<Notification> {
    vec![
        Notification {
            id: 1,
            kind: "system".to_string(),
            message: "Blog Microservices system initialized successfully".to_string(),
            timestamp: now - Duration::hours(1),
            read: true,
            priority: Priority::Low,
            read_at: None,
            user_id: None,
            blog_id: None,
            comment_id: None,
            broadcast: None,
        },
        Notification {
            id: 2,
            kind: "user_registered".to_string(),
            message: "New user registered: Alice Brown (alice.brown@example.com)".to_string(),
            timestamp: now - Duration::minutes(30),
            read: false,
            priority: Priority::Medium,
            read_at: None,
            user_id: Some(4),
            blog_id: None,
            comment_id: None,
            broadcast: None,
        },
        Notification {
            id: 3,
            kind: "blog_created".to_string(),
            message: "New blog post: \"Understanding Service Mesh Architecture\" by Jane Smith"
                .to_string(),
            timestamp: now - Duration::minutes(15),
            read: false,
            priority: Priority::High,
            read_at: None,
            user_id: None,
            blog_id: Some(2),
            comment_id: None,
            broadcast: None,
        },
    ]
}
