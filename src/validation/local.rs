/// Peer lookups against stores hosted in the same process
use super::{Existence, PeerLookup, PeerStore};
use crate::store::{BlogStore, CommentStore, NotificationStore, UserStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Direct lookups for `all` mode. Unregistered stores are unreachable.
#[derive(Default, Clone)]
pub struct LocalPeerLookup {
    blogs: Option<Arc<BlogStore>>,
    comments: Option<Arc<CommentStore>>,
    users: Option<Arc<UserStore>>,
    notifications: Option<Arc<NotificationStore>>,
}

impl LocalPeerLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blogs(mut self, store: Arc<BlogStore>) -> Self {
        self.blogs = Some(store);
        self
    }

    pub fn with_comments(mut self, store: Arc<CommentStore>) -> Self {
        self.comments = Some(store);
        self
    }

    pub fn with_users(mut self, store: Arc<UserStore>) -> Self {
        self.users = Some(store);
        self
    }

    pub fn with_notifications(mut self, store: Arc<NotificationStore>) -> Self {
        self.notifications = Some(store);
        self
    }
}

fn answer(found: bool) -> Existence {
    if found {
        Existence::Found
    } else {
        Existence::NotFound
    }
}

#[async_trait]
impl PeerLookup for LocalPeerLookup {
    async fn exists(&self, store: PeerStore, id: u64) -> Existence {
        match store {
            PeerStore::Blog => match &self.blogs {
                Some(blogs) => answer(blogs.exists(id).await),
                None => Existence::Unreachable,
            },
            PeerStore::Comment => match &self.comments {
                Some(comments) => answer(comments.exists(id).await),
                None => Existence::Unreachable,
            },
            PeerStore::User => match &self.users {
                Some(users) => answer(users.exists(id).await),
                None => Existence::Unreachable,
            },
            PeerStore::Notification => match &self.notifications {
                Some(notifications) => answer(notifications.get(id).await.is_ok()),
                None => Existence::Unreachable,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_store() {
        let lookup = LocalPeerLookup::new().with_blogs(Arc::new(BlogStore::seeded()));
        assert_eq!(lookup.exists(PeerStore::Blog, 2).await, Existence::Found);
        assert_eq!(lookup.exists(PeerStore::Blog, 999).await, Existence::NotFound);
    }

    #[tokio::test]
    async fn test_unregistered_store_is_unreachable() {
        let lookup = LocalPeerLookup::new();
        assert_eq!(lookup.exists(PeerStore::User, 1).await, Existence::Unreachable);
    }
}
