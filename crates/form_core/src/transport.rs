use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::{ServerResponse, SubmitPayload, TransportError};
use tracing::{debug, warn};
use url::Url;

use crate::{LifecycleError, Submitter};

/// Posts `{"form": <data>}` as JSON and reads a JSON answer.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    http: Client,
    url: Url,
}

impl HttpSubmitter {
    pub fn new(url: &str) -> Result<Self, LifecycleError> {
        Self::build(url, Client::builder())
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, LifecycleError> {
        Self::build(url, Client::builder().timeout(timeout))
    }

    fn build(url: &str, builder: reqwest::ClientBuilder) -> Result<Self, LifecycleError> {
        let url = Url::parse(url).map_err(|source| LifecycleError::InvalidSubmitUrl {
            url: url.to_string(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LifecycleError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }

        Ok(Self {
            http: builder.build()?,
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, form: Value) -> Result<ServerResponse, TransportError> {
        debug!(url = %self.url, "form: posting submission");
        let response = self
            .http
            .post(self.url.clone())
            .json(&SubmitPayload { form })
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %self.url, status = status.as_u16(), "form: submission rejected by server");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: status_message(status, &body),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        Ok(ServerResponse::from_body(body))
    }
}

/// Prefers a JSON `message` or `error` field from the body, then the
/// status reason phrase.
fn status_message(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });

    from_body
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "unknown error".to_string())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
