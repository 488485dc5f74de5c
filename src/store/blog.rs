/// Blog post store
use crate::{
    error::MeshResult,
    stats::BlogStats,
    store::{provided, Record, RecordStore},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Blog post record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub likes: u64,
}

impl Record for Blog {
    const KIND: &'static str = "Blog";

    fn id(&self) -> u64 {
        self.id
    }
}

/// Create blog request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewBlog {
    #[validate(
        required(message = "title is required"),
        length(min = 1, message = "title is required")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "content is required"),
        length(min = 1, message = "content is required")
    )]
    pub content: Option<String>,
    #[validate(
        required(message = "author is required"),
        length(min = 1, message = "author is required")
    )]
    pub author: Option<String>,
}

/// Partial blog update; absent or blank fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Blog store
pub struct BlogStore {
    records: RecordStore<Blog>,
}

impl BlogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: RecordStore::new(),
        }
    }

    /// Create a store holding the sample posts
    pub fn seeded() -> Self {
        Self::with_records(seed(Utc::now()))
    }

    pub fn with_records(blogs: Vec<Blog>) -> Self {
        Self {
            records: RecordStore::with_records(blogs),
        }
    }

    /// Create a blog post
    pub async fn create(&self, req: NewBlog) -> MeshResult<Blog> {
        req.validate()?;
        let now = Utc::now();

        self.records
            .insert(|id, _| {
                Ok(Blog {
                    id,
                    title: req.title.unwrap_or_default(),
                    content: req.content.unwrap_or_default(),
                    author: req.author.unwrap_or_default(),
                    created_at: now,
                    updated_at: None,
                    likes: 0,
                })
            })
            .await
    }

    pub async fn get(&self, id: u64) -> MeshResult<Blog> {
        self.records.get(id).await
    }

    pub async fn exists(&self, id: u64) -> bool {
        self.records.contains(id).await
    }

    pub async fn list(&self) -> Vec<Blog> {
        self.records.list().await
    }

    pub async fn len(&self) -> usize {
        self.records.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.records.is_empty().await
    }

    /// Apply a partial update
    pub async fn update(&self, id: u64, patch: BlogPatch) -> MeshResult<Blog> {
        let title = provided(patch.title);
        let content = provided(patch.content);

        self.records
            .update(id, |blog, _| {
                if let Some(title) = title {
                    blog.title = title;
                }
                if let Some(content) = content {
                    blog.content = content;
                }
                blog.updated_at = Some(Utc::now());
                Ok(())
            })
            .await
    }

    /// Add one like, returning the new total
    pub async fn like(&self, id: u64) -> MeshResult<u64> {
        let blog = self
            .records
            .update(id, |blog, _| {
                blog.likes = blog.likes.saturating_add(1);
                Ok(())
            })
            .await?;
        Ok(blog.likes)
    }

    pub async fn delete(&self, id: u64) -> MeshResult<Blog> {
        self.records.remove(id).await
    }

    /// Aggregate statistics over the current posts
    pub async fn stats(&self) -> BlogStats {
        BlogStats::from_records(&self.records.list().await)
    }
}

impl Default for BlogStore {
    fn default() -> Self {
        Self::new()
    }
}

fn seed(now: DateTime<Utc>) -> Vec<Blog> {
    vec![
        Blog {
            id: 1,
            title: "Welcome to Microservices with Istio".to_string(),
            content: "This is our first blog post demonstrating how microservices work together with Istio service mesh. Each service is independent and communicates through well-defined APIs.".to_string(),
            author: "John Doe".to_string(),
            created_at: now,
            updated_at: None,
            likes: 15,
        },
        Blog {
            id: 2,
            title: "Understanding Service Mesh Architecture".to_string(),
            content: "Service mesh provides a dedicated infrastructure layer for handling service-to-service communication. It makes communication between service instances flexible, reliable, and fast.".to_string(),
            author: "Jane Smith".to_string(),
            created_at: now - Duration::days(1),
            updated_at: None,
            likes: 23,
        },
        Blog {
            id: 3,
            title: "Kubernetes and Microservices Best Practices".to_string(),
            content: "Running microservices on Kubernetes requires careful planning. This post covers deployment strategies, service discovery, and configuration management.".to_string(),
            author: "Mike Johnson".to_string(),
            created_at: now - Duration::days(2),
            updated_at: None,
            likes: 8,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use std::sync::Arc;

    fn new_blog(title: &str) -> NewBlog {
        NewBlog {
            title: Some(title.to_string()),
            content: Some("Body".to_string()),
            author: Some("Ada".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_next_id_and_defaults() {
        let store = BlogStore::seeded();
        let blog = store.create(new_blog("Fourth")).await.unwrap();

        assert_eq!(blog.id, 4);
        assert_eq!(blog.likes, 0);
        assert!(blog.updated_at.is_none());
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let store = BlogStore::new();
        let err = store
            .create(NewBlog {
                title: Some(String::new()),
                ..new_blog("x")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::Validation(ref m) if m.contains("title")));

        let err = store.create(NewBlog::default()).await.unwrap_err();
        assert!(matches!(err, MeshError::Validation(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let store = BlogStore::seeded();
        let updated = store
            .update(
                1,
                BlogPatch {
                    title: Some("Renamed".to_string()),
                    content: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert!(updated.content.starts_with("This is our first blog post"));
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.likes, 15);

        let missing = store.update(99, BlogPatch::default()).await;
        assert!(matches!(missing, Err(MeshError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_likes_are_not_lost() {
        let store = Arc::new(BlogStore::seeded());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.like(3).await.unwrap();
                store.get(3).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get(3).await.unwrap().likes, 8 + 50);
    }

    #[tokio::test]
    async fn test_delete_then_lookup() {
        let store = BlogStore::seeded();
        let deleted = store.delete(2).await.unwrap();
        assert_eq!(deleted.author, "Jane Smith");
        assert!(!store.exists(2).await);
        assert!(matches!(store.get(2).await, Err(MeshError::NotFound(_))));

        let next = store.create(new_blog("After delete")).await.unwrap();
        assert_eq!(next.id, 4);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let blog = seed(Utc::now()).remove(0);
        let json = serde_json::to_value(&blog).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_none());
        assert_eq!(json["likes"], 15);
    }
}
