/// Comment store
use crate::{
    error::MeshResult,
    stats::CommentStats,
    store::{lenient_id, provided, Record, RecordStore},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Comment record. `blog_id` is only checked against the blog service at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    pub blog_id: u64,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub likes: u64,
}

impl Record for Comment {
    const KIND: &'static str = "Comment";

    fn id(&self) -> u64 {
        self.id
    }
}

/// Create comment request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[serde(default, deserialize_with = "lenient_id")]
    #[validate(
        required(message = "blogId is required"),
        range(min = 1, message = "blogId is required")
    )]
    pub blog_id: Option<u64>,
    #[validate(
        required(message = "author is required"),
        length(min = 1, message = "author is required")
    )]
    pub author: Option<String>,
    #[validate(
        required(message = "content is required"),
        length(min = 1, message = "content is required")
    )]
    pub content: Option<String>,
}

/// Partial comment update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPatch {
    pub content: Option<String>,
}

/// Comment store
pub struct CommentStore {
    records: RecordStore<Comment>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self {
            records: RecordStore::new(),
        }
    }

    /// Create a store holding the sample comments
    pub fn seeded() -> Self {
        Self::with_records(seed(Utc::now()))
    }

    pub fn with_records(comments: Vec<Comment>) -> Self {
        Self {
            records: RecordStore::with_records(comments),
        }
    }

    /// Create a comment. Parent validation is the caller's concern.
    pub async fn create(&self, req: NewComment) -> MeshResult<Comment> {
        req.validate()?;
        let now = Utc::now();

        self.records
            .insert(|id, _| {
                Ok(Comment {
                    id,
                    blog_id: req.blog_id.unwrap_or_default(),
                    author: req.author.unwrap_or_default(),
                    content: req.content.unwrap_or_default(),
                    created_at: now,
                    updated_at: None,
                    likes: 0,
                })
            })
            .await
    }

    pub async fn get(&self, id: u64) -> MeshResult<Comment> {
        self.records.get(id).await
    }

    pub async fn exists(&self, id: u64) -> bool {
        self.records.contains(id).await
    }

    pub async fn list(&self) -> Vec<Comment> {
        self.records.list().await
    }

    /// Comments attached to one blog, in insertion order
    pub async fn list_for_blog(&self, blog_id: u64) -> Vec<Comment> {
        self.records.list_where(|c| c.blog_id == blog_id).await
    }

    pub async fn len(&self) -> usize {
        self.records.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.records.is_empty().await
    }

    pub async fn update(&self, id: u64, patch: CommentPatch) -> MeshResult<Comment> {
        let content = provided(patch.content);

        self.records
            .update(id, |comment, _| {
                if let Some(content) = content {
                    comment.content = content;
                }
                comment.updated_at = Some(Utc::now());
                Ok(())
            })
            .await
    }

    /// Add one like, returning the new total
    pub async fn like(&self, id: u64) -> MeshResult<u64> {
        let comment = self
            .records
            .update(id, |comment, _| {
                comment.likes = comment.likes.saturating_add(1);
                Ok(())
            })
            .await?;
        Ok(comment.likes)
    }

    pub async fn delete(&self, id: u64) -> MeshResult<Comment> {
        self.records.remove(id).await
    }

    pub async fn stats(&self) -> CommentStats {
        CommentStats::from_records(&self.records.list().await)
    }
}

impl Default for CommentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn seed(now: DateTime<Utc>) -> Vec<Comment> {
    let comment = |id: u64, blog_id: u64, author: &str, content: &str, age_secs: i64, likes: u64| {
        Comment {
            id,
            blog_id,
            author: author.to_string(),
            content: content.to_string(),
            created_at: now - Duration::seconds(age_secs),
            updated_at: None,
            likes,
        }
    };

    vec![
        comment(1, 1, "Alice Brown", "Great introduction to microservices! Very helpful for beginners.", 3600, 5),
        comment(2, 1, "Bob Wilson", "Looking forward to more posts about Istio configuration.", 1800, 2),
        comment(3, 2, "Carol Davis", "Service mesh is indeed a game-changer for microservices architecture.", 7200, 8),
        comment(4, 2, "David Miller", "Can you write more about traffic management in Istio?", 3600, 3),
        comment(5, 3, "Eva Garcia", "Kubernetes best practices are always evolving. Thanks for sharing!", 5400, 4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;

    #[tokio::test]
    async fn test_seed_and_next_id() {
        let store = CommentStore::seeded();
        assert_eq!(store.len().await, 5);

        let comment = store
            .create(NewComment {
                blog_id: Some(3),
                author: Some("Finn".to_string()),
                content: Some("Nice".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(comment.id, 6);
        assert_eq!(comment.blog_id, 3);
        assert_eq!(comment.likes, 0);
    }

    #[tokio::test]
    async fn test_list_for_blog() {
        let store = CommentStore::seeded();
        let ids: Vec<u64> = store.list_for_blog(2).await.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 4]);
        assert!(store.list_for_blog(42).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_blog_id_is_rejected() {
        let store = CommentStore::new();
        let err = store
            .create(NewComment {
                blog_id: None,
                author: Some("Finn".to_string()),
                content: Some("Nice".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::Validation(ref m) if m.contains("blogId")));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_like_and_update() {
        let store = CommentStore::seeded();
        assert_eq!(store.like(2).await.unwrap(), 3);

        let updated = store
            .update(
                2,
                CommentPatch {
                    content: Some("Edited".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "Edited");
        assert_eq!(updated.likes, 3);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_blog_id_accepts_string() {
        let req: NewComment =
            serde_json::from_str(r#"{"blogId": "2", "author": "a", "content": "b"}"#).unwrap();
        assert_eq!(req.blog_id, Some(2));
        assert!(req.validate().is_ok());
    }
}
