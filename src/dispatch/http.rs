/// Notification delivery over HTTP
use super::{NotificationEvent, NotificationSink};
use crate::error::{MeshError, MeshResult};
use async_trait::async_trait;
use reqwest::Client;

/// Posts events to `{notification_url}/notify`
pub struct HttpSink {
    http_client: Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(http_client: Client, notification_url: &str) -> Self {
        Self {
            http_client,
            endpoint: format!("{}/notify", notification_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NotificationSink for HttpSink {
    async fn deliver(&self, event: &NotificationEvent) -> MeshResult<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(|e| MeshError::Dispatch(format!("POST {} failed: {}", self.endpoint, e)))?;

        if !response.status().is_success() {
            return Err(MeshError::Dispatch(format!(
                "POST {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        Ok(())
    }
}
