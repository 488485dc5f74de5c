/// Configuration management for blogmesh
use crate::{
    error::{MeshError, MeshResult},
    validation::UnreachablePolicy,
};
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "blogmesh=debug,tower_http=debug";

/// Upper bound for `NOTIFICATION_RETENTION_DAYS`
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Which part of the constellation this process hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Blog,
    Comment,
    User,
    Notification,
    Gateway,
    All,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Blog => "blog",
            ServiceKind::Comment => "comment",
            ServiceKind::User => "user",
            ServiceKind::Notification => "notification",
            ServiceKind::Gateway => "gateway",
            ServiceKind::All => "all",
        }
    }
}

impl FromStr for ServiceKind {
    type Err = MeshError;

    fn from_str(s: &str) -> MeshResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "blog" => Ok(ServiceKind::Blog),
            "comment" => Ok(ServiceKind::Comment),
            "user" => Ok(ServiceKind::User),
            "notification" => Ok(ServiceKind::Notification),
            "gateway" => Ok(ServiceKind::Gateway),
            "all" => Ok(ServiceKind::All),
            _ => Err(MeshError::Config(format!("Invalid service kind: {}", s))),
        }
    }
}

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub ports: PortsConfig,
    pub peers: PeersConfig,
    pub validation: ValidationConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub kind: ServiceKind,
    pub hostname: String,
    /// Explicit port for single-service modes (`PORT`)
    pub port_override: Option<u16>,
    /// Version reported by `/health`
    pub version: String,
}

/// Listening ports per service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortsConfig {
    pub gateway: u16,
    pub blog: u16,
    pub comment: u16,
    pub user: u16,
    pub notification: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            gateway: 3000,
            blog: 3001,
            comment: 3002,
            user: 3003,
            notification: 3004,
        }
    }
}

/// Base URLs of peer services, used for HTTP validation, dispatch and the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeersConfig {
    pub blog_url: String,
    pub comment_url: String,
    pub user_url: String,
    pub notification_url: String,
    /// Timeout applied to every peer request
    pub timeout_secs: u64,
}

impl Default for PeersConfig {
    fn default() -> Self {
        Self {
            blog_url: "http://localhost:3001".to_string(),
            comment_url: "http://localhost:3002".to_string(),
            user_url: "http://localhost:3003".to_string(),
            notification_url: "http://localhost:3004".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Dependency validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub unreachable_policy: UnreachablePolicy,
}

/// Notification service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Result cap for `GET /notifications` when no `limit` is given
    pub default_list_limit: usize,
    /// Age threshold for cleanup when no `olderThanDays` is given
    pub retention_days: u32,
    /// Interval of the background retention sweep, 0 disables it
    pub sweep_interval_secs: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            default_list_limit: 50,
            retention_days: 30,
            sweep_interval_secs: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> MeshResult<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> MeshResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = var("MESH_SERVICE")
            .unwrap_or_else(|| "all".to_string())
            .parse::<ServiceKind>()?;
        let hostname = var("MESH_HOSTNAME").unwrap_or_else(|| "0.0.0.0".to_string());
        let port_override = match var("PORT") {
            Some(raw) => Some(parse_port("PORT", &raw)?),
            None => None,
        };
        let version = var("MESH_SERVICE_VERSION").unwrap_or_else(|| "1.0.0".to_string());

        let defaults = PortsConfig::default();
        let port = |key: &str, default: u16| -> MeshResult<u16> {
            match var(key) {
                Some(raw) => parse_port(key, &raw),
                None => Ok(default),
            }
        };
        let ports = PortsConfig {
            gateway: port("GATEWAY_PORT", defaults.gateway)?,
            blog: port("BLOG_PORT", defaults.blog)?,
            comment: port("COMMENT_PORT", defaults.comment)?,
            user: port("USER_PORT", defaults.user)?,
            notification: port("NOTIFICATION_PORT", defaults.notification)?,
        };

        let peer_defaults = PeersConfig::default();
        let peers = PeersConfig {
            blog_url: var("BLOG_SERVICE_URL").unwrap_or(peer_defaults.blog_url),
            comment_url: var("COMMENT_SERVICE_URL").unwrap_or(peer_defaults.comment_url),
            user_url: var("USER_SERVICE_URL").unwrap_or(peer_defaults.user_url),
            notification_url: var("NOTIFICATION_SERVICE_URL")
                .unwrap_or(peer_defaults.notification_url),
            timeout_secs: parse_setting(
                "MESH_PEER_TIMEOUT_SECS",
                var("MESH_PEER_TIMEOUT_SECS"),
                peer_defaults.timeout_secs,
            )?,
        };

        let unreachable_policy = var("MESH_UNREACHABLE_POLICY")
            .unwrap_or_else(|| "fail-closed".to_string())
            .parse::<UnreachablePolicy>()?;

        let notification_defaults = NotificationsConfig::default();
        let notifications = NotificationsConfig {
            default_list_limit: parse_setting(
                "NOTIFICATION_LIST_LIMIT",
                var("NOTIFICATION_LIST_LIMIT"),
                notification_defaults.default_list_limit,
            )?,
            retention_days: parse_setting(
                "NOTIFICATION_RETENTION_DAYS",
                var("NOTIFICATION_RETENTION_DAYS"),
                notification_defaults.retention_days,
            )?,
            sweep_interval_secs: parse_setting(
                "NOTIFICATION_SWEEP_INTERVAL_SECS",
                var("NOTIFICATION_SWEEP_INTERVAL_SECS"),
                notification_defaults.sweep_interval_secs,
            )?,
        };

        let level = var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let json = var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(ServerConfig {
            service: ServiceConfig {
                kind,
                hostname,
                port_override,
                version,
            },
            ports,
            peers,
            validation: ValidationConfig { unreachable_policy },
            notifications,
            logging: LoggingConfig { level, json },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> MeshResult<()> {
        if self.service.hostname.is_empty() {
            return Err(MeshError::Config("Hostname cannot be empty".to_string()));
        }

        if self.service.kind == ServiceKind::All && self.service.port_override.is_some() {
            return Err(MeshError::Config(
                "PORT cannot be used when hosting all services; set the per-service ports instead"
                    .to_string(),
            ));
        }

        for (name, url) in [
            ("BLOG_SERVICE_URL", &self.peers.blog_url),
            ("COMMENT_SERVICE_URL", &self.peers.comment_url),
            ("USER_SERVICE_URL", &self.peers.user_url),
            ("NOTIFICATION_SERVICE_URL", &self.peers.notification_url),
        ] {
            reqwest::Url::parse(url)
                .map_err(|e| MeshError::Config(format!("Invalid {}: {}", name, e)))?;
        }

        if self.peers.timeout_secs == 0 {
            return Err(MeshError::Config(
                "Peer timeout must be at least one second".to_string(),
            ));
        }

        if self.notifications.default_list_limit == 0 {
            return Err(MeshError::Config(
                "Notification list limit must be positive".to_string(),
            ));
        }

        if self.notifications.retention_days > MAX_RETENTION_DAYS {
            return Err(MeshError::Config(format!(
                "Notification retention cannot exceed {} days",
                MAX_RETENTION_DAYS
            )));
        }

        Ok(())
    }

    /// Port a given service listens on
    pub fn port_for(&self, kind: ServiceKind) -> u16 {
        if let Some(port) = self.service.port_override {
            return port;
        }
        match kind {
            ServiceKind::Blog => self.ports.blog,
            ServiceKind::Comment => self.ports.comment,
            ServiceKind::User => self.ports.user,
            ServiceKind::Notification => self.ports.notification,
            ServiceKind::Gateway | ServiceKind::All => self.ports.gateway,
        }
    }
}

fn parse_port(key: &str, raw: &str) -> MeshResult<u16> {
    raw.trim()
        .parse()
        .map_err(|_| MeshError::Config(format!("Invalid port number in {}: {}", key, raw)))
}

fn parse_setting<T: FromStr>(key: &str, raw: Option<String>, default: T) -> MeshResult<T> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| MeshError::Config(format!("Invalid value in {}: {}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> MeshResult<ServerConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.service.kind, ServiceKind::All);
        assert_eq!(config.service.version, "1.0.0");
        assert_eq!(config.port_for(ServiceKind::Blog), 3001);
        assert_eq!(config.port_for(ServiceKind::Notification), 3004);
        assert_eq!(config.peers.notification_url, "http://localhost:3004");
        assert_eq!(
            config.validation.unreachable_policy,
            UnreachablePolicy::FailClosed
        );
        assert_eq!(config.notifications.default_list_limit, 50);
        assert_eq!(config.notifications.retention_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_single_service_port_override() {
        let config = load(&[("MESH_SERVICE", "comment"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.service.kind, ServiceKind::Comment);
        assert_eq!(config.port_for(ServiceKind::Comment), 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_override_rejected_for_all() {
        let config = load(&[("PORT", "8080")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("MESH_SERVICE", "payments")]).is_err());
        assert!(load(&[("BLOG_PORT", "not-a-port")]).is_err());
        assert!(load(&[("MESH_UNREACHABLE_POLICY", "sometimes")]).is_err());

        let config = load(&[("BLOG_SERVICE_URL", "not a url")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_notification_settings() {
        for key in [
            "NOTIFICATION_LIST_LIMIT",
            "NOTIFICATION_RETENTION_DAYS",
            "NOTIFICATION_SWEEP_INTERVAL_SECS",
        ] {
            assert!(
                matches!(load(&[(key, "soon")]), Err(MeshError::Config(_))),
                "{} accepted a non-number",
                key
            );
        }

        let config = load(&[("NOTIFICATION_RETENTION_DAYS", " 90 ")]).unwrap();
        assert_eq!(config.notifications.retention_days, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retention_days_bounded() {
        let config = load(&[("NOTIFICATION_RETENTION_DAYS", "36500")]).unwrap();
        assert!(config.validate().is_ok());

        let config = load(&[("NOTIFICATION_RETENTION_DAYS", "100000000")]).unwrap();
        assert!(matches!(config.validate(), Err(MeshError::Config(_))));
    }

    #[test]
    fn test_fail_open_policy() {
        let config = load(&[("MESH_UNREACHABLE_POLICY", "fail-open")]).unwrap();
        assert_eq!(
            config.validation.unreachable_policy,
            UnreachablePolicy::FailOpen
        );
    }
}
