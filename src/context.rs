/// Application context and dependency injection
use crate::{
    api::ServiceInfo,
    config::ServerConfig,
    dispatch::{HttpSink, NotificationDispatcher},
    error::{MeshError, MeshResult},
    validation::{HttpPeerLookup, ValidationClient},
};
use reqwest::Client;
use std::{sync::Arc, time::Duration};

/// Process-wide shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    /// HTTP client for peer calls, bounded by the peer timeout
    pub http_client: Client,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: ServerConfig) -> MeshResult<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.peers.timeout_secs))
            .user_agent(concat!("blogmesh/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MeshError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    pub fn service_info(&self, name: &'static str) -> ServiceInfo {
        ServiceInfo::new(name, self.config.service.version.clone())
    }

    /// Validation client that asks peer services over HTTP
    pub fn remote_validation(&self) -> ValidationClient {
        let lookup = HttpPeerLookup::new(self.http_client.clone(), self.config.peers.clone());
        ValidationClient::new(Arc::new(lookup), self.config.validation.unreachable_policy)
    }

    /// Dispatcher that posts to the notification service over HTTP
    pub fn remote_dispatcher(&self, origin: &'static str) -> NotificationDispatcher {
        let sink = HttpSink::new(self.http_client.clone(), &self.config.peers.notification_url);
        NotificationDispatcher::new(Arc::new(sink), origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_context_rejects_invalid_config() {
        let vars: HashMap<&str, &str> = [("MESH_PEER_TIMEOUT_SECS", "0")].into_iter().collect();
        let config = ServerConfig::from_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert!(AppContext::new(config).is_err());
    }

    #[test]
    fn test_service_info_uses_configured_version() {
        let vars: HashMap<&str, &str> = [("MESH_SERVICE_VERSION", "2.3.4")].into_iter().collect();
        let config = ServerConfig::from_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        let ctx = AppContext::new(config).unwrap();
        let info = ctx.service_info("user-service");
        assert_eq!(info.name, "user-service");
        assert_eq!(info.version, "2.3.4");
    }
}
