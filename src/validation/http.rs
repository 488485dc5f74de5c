/// Peer lookups over HTTP
use super::{Existence, PeerLookup, PeerStore};
use crate::config::PeersConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Asks peer services `GET {base}/{collection}/{id}`
pub struct HttpPeerLookup {
    http_client: Client,
    peers: PeersConfig,
}

impl HttpPeerLookup {
    /// `http_client` should carry the peer timeout
    pub fn new(http_client: Client, peers: PeersConfig) -> Self {
        Self { http_client, peers }
    }

    fn base_url(&self, store: PeerStore) -> &str {
        match store {
            PeerStore::Blog => &self.peers.blog_url,
            PeerStore::Comment => &self.peers.comment_url,
            PeerStore::User => &self.peers.user_url,
            PeerStore::Notification => &self.peers.notification_url,
        }
    }

    fn record_url(&self, store: PeerStore, id: u64) -> String {
        format!(
            "{}/{}/{}",
            self.base_url(store).trim_end_matches('/'),
            store.collection(),
            id
        )
    }
}

#[async_trait]
impl PeerLookup for HttpPeerLookup {
    async fn exists(&self, store: PeerStore, id: u64) -> Existence {
        let url = self.record_url(store, id);
        debug!("Checking {}", url);

        match self.http_client.get(&url).send().await {
            Ok(response) if response.status().is_success() => Existence::Found,
            Ok(response) if response.status() == StatusCode::NOT_FOUND => Existence::NotFound,
            Ok(response) => {
                warn!("Unexpected status {} from {}", response.status(), url);
                Existence::Unreachable
            }
            Err(e) => {
                warn!("Failed to reach {}: {}", url, e);
                Existence::Unreachable
            }
        }
    }
}
