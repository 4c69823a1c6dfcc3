//! Outbound message delivery.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::SendError;

/// Performs one delivery attempt. Implementations report every outcome
/// through the returned `Result`; they never panic.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, target: &str, token: &SecretString, payload: &str)
    -> Result<(), SendError>;
}

/// Posts `{"access_token", "message"}` as JSON to an HTTP endpoint.
pub struct HttpSender {
    endpoint_template: String,
    client: reqwest::Client,
}

impl HttpSender {
    /// `endpoint_template` must contain a `{target}` placeholder.
    pub fn new(endpoint_template: impl Into<String>, timeout: Duration) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("convo-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint_template: endpoint_template.into(),
            client,
        })
    }

    fn endpoint(&self, target: &str) -> String {
        self.endpoint_template.replace("{target}", target)
    }
}

#[async_trait]
impl MessageSender for HttpSender {
    async fn send(
        &self,
        target: &str,
        token: &SecretString,
        payload: &str,
    ) -> Result<(), SendError> {
        let body = serde_json::json!({
            "access_token": token.expose_secret(),
            "message": payload,
        });

        let resp = self
            .client
            .post(self.endpoint(target))
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            tracing::debug!(status = status.as_u16(), target, "Send rejected");
            Err(SendError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_substitutes_target() {
        let sender = HttpSender::new(
            "https://chat.example.com/api/conversations/{target}/messages",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            sender.endpoint("42"),
            "https://chat.example.com/api/conversations/42/messages"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let sender = HttpSender::new(
            format!("http://127.0.0.1:{port}/{{target}}"),
            Duration::from_secs(2),
        )
        .unwrap();
        let token = SecretString::from("t1".to_string());
        let result = sender.send("convo", &token, "hello").await;
        assert!(matches!(result, Err(SendError::Transport(_))));
    }
}
