// HTTP side of the widget: one POST per message, plus the backend health probe.

use std::future::Future;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::ChatConfig;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid chat endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to reach chat backend at {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("chat backend returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response from chat backend")]
    Malformed(#[from] serde_json::Error),
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Reply of `POST /chat`. Only `response` is required.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub sources: Vec<String>,
}

// Informational fields: a null or mistyped value falls back to the default
// instead of failing the whole reply.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl ChatReply {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            confidence: None,
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Anything that can answer a chat message.
///
/// Implementations are shared between concurrently running sends, so the
/// returned future must not borrow from the caller beyond `self`.
pub trait ChatBackend: Send + Sync + 'static {
    fn send_message(
        &self,
        message: String,
    ) -> impl Future<Output = Result<ChatReply, ChatError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    endpoint: Url,
    user_id: Option<String>,
}

impl HttpChatBackend {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let endpoint = config.endpoint_url()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| ChatError::Transport {
            url: endpoint.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            endpoint,
            user_id: config.user_id.clone(),
        })
    }

    /// `/health` on the same origin as the chat endpoint.
    pub fn health_url(&self) -> Result<Url, ChatError> {
        self.endpoint
            .join("/health")
            .map_err(|source| ChatError::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
                reason: source.to_string(),
            })
    }

    #[instrument(skip(self, message), fields(endpoint = %self.endpoint, len = message.len()))]
    pub async fn post_message(&self, message: String) -> Result<ChatReply, ChatError> {
        let payload = ChatRequest {
            message,
            user_id: self.user_id.clone(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|source| self.transport_error(source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| self.transport_error(source))?;

        if !status.is_success() {
            error!(%status, %body, "Chat backend request failed");
            return Err(ChatError::Status { status, body });
        }

        let reply: ChatReply = serde_json::from_str(&body)?;
        debug!(
            confidence = ?reply.confidence,
            sources = ?reply.sources,
            "Received chat reply"
        );
        Ok(reply)
    }

    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus, ChatError> {
        let url = self.health_url()?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ChatError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ChatError::Transport {
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(ChatError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn transport_error(&self, source: reqwest::Error) -> ChatError {
        ChatError::Transport {
            url: self.endpoint.to_string(),
            source,
        }
    }
}

impl ChatBackend for HttpChatBackend {
    fn send_message(
        &self,
        message: String,
    ) -> impl Future<Output = Result<ChatReply, ChatError>> + Send {
        self.post_message(message)
    }
}
