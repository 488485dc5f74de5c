/// Cross-service dependency validation
///
/// A dependent write (e.g. creating a comment) first asks the owning peer
/// store whether the referenced parent exists. Lookups go through a
/// [`PeerLookup`] backend; the [`ValidationClient`] turns the answer into
/// an admit/reject decision according to the configured
/// [`UnreachablePolicy`].

pub mod http;
pub mod local;

pub use http::HttpPeerLookup;
pub use local::LocalPeerLookup;

use crate::{
    error::{MeshError, MeshResult},
    metrics,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use tracing::{debug, warn};

/// A peer store that can be asked about existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerStore {
    Blog,
    Comment,
    User,
    Notification,
}

impl PeerStore {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerStore::Blog => "blog",
            PeerStore::Comment => "comment",
            PeerStore::User => "user",
            PeerStore::Notification => "notification",
        }
    }

    /// Collection path segment on the peer's HTTP API
    pub fn collection(&self) -> &'static str {
        match self {
            PeerStore::Blog => "blogs",
            PeerStore::Comment => "comments",
            PeerStore::User => "users",
            PeerStore::Notification => "notifications",
        }
    }

    /// Entity name used in rejection messages
    pub fn entity(&self) -> &'static str {
        match self {
            PeerStore::Blog => "Blog",
            PeerStore::Comment => "Comment",
            PeerStore::User => "User",
            PeerStore::Notification => "Notification",
        }
    }
}

/// Answer to "does record `id` exist in the peer store"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Found,
    NotFound,
    /// Peer could not be asked (transport error, timeout, unexpected status)
    Unreachable,
}

impl Existence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Existence::Found => "found",
            Existence::NotFound => "not_found",
            Existence::Unreachable => "unreachable",
        }
    }
}

/// What to do when the peer store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnreachablePolicy {
    /// Reject the dependent write exactly like a missing parent
    FailClosed,
    /// Admit the dependent write and log a warning
    FailOpen,
}

impl UnreachablePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnreachablePolicy::FailClosed => "fail-closed",
            UnreachablePolicy::FailOpen => "fail-open",
        }
    }
}

impl FromStr for UnreachablePolicy {
    type Err = MeshError;

    fn from_str(s: &str) -> MeshResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail-closed" => Ok(UnreachablePolicy::FailClosed),
            "fail-open" => Ok(UnreachablePolicy::FailOpen),
            _ => Err(MeshError::Config(format!(
                "Invalid unreachable policy: {} (expected fail-closed or fail-open)",
                s
            ))),
        }
    }
}

impl Default for UnreachablePolicy {
    fn default() -> Self {
        UnreachablePolicy::FailClosed
    }
}

/// Existence lookup backend
#[async_trait]
pub trait PeerLookup: Send + Sync {
    async fn exists(&self, store: PeerStore, id: u64) -> Existence;
}

/// Admit/reject decisions for dependent writes
#[derive(Clone)]
pub struct ValidationClient {
    lookup: Arc<dyn PeerLookup>,
    policy: UnreachablePolicy,
}

impl ValidationClient {
    pub fn new(lookup: Arc<dyn PeerLookup>, policy: UnreachablePolicy) -> Self {
        Self { lookup, policy }
    }

    pub fn policy(&self) -> UnreachablePolicy {
        self.policy
    }

    /// Raw existence answer from the backend
    pub async fn exists(&self, store: PeerStore, id: u64) -> Existence {
        self.lookup.exists(store, id).await
    }

    /// Succeed only if the write referencing `store`/`id` may proceed
    pub async fn require(&self, store: PeerStore, id: u64) -> MeshResult<()> {
        let existence = self.exists(store, id).await;
        metrics::record_validation(store.as_str(), existence.as_str());

        match (existence, self.policy) {
            (Existence::Found, _) => {
                debug!("{} {} exists", store.entity(), id);
                Ok(())
            }
            (Existence::Unreachable, UnreachablePolicy::FailOpen) => {
                warn!(
                    "{} service unreachable while checking id {}; admitting write (fail-open)",
                    store.entity(),
                    id
                );
                Ok(())
            }
            (Existence::Unreachable, UnreachablePolicy::FailClosed) => {
                warn!(
                    "{} service unreachable while checking id {}; rejecting write",
                    store.entity(),
                    id
                );
                Err(dependency_not_found(store))
            }
            (Existence::NotFound, _) => Err(dependency_not_found(store)),
        }
    }
}

fn dependency_not_found(store: PeerStore) -> MeshError {
    MeshError::DependencyNotFound(format!("{} not found", store.entity()))
}
