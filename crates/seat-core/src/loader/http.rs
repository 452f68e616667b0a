use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{LoadError, PageLoader};
use crate::config::WatchConfig;

/// HTTP page loader. One attempt per call; a failed fetch is simply a
/// missed observation.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(timeout: Duration, user_agent: &str) -> reqwest::Result<Self> {
        Ok(Self::with_client(Self::build_client(timeout, user_agent)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &WatchConfig) -> reqwest::Result<Self> {
        Self::new(config.request_timeout, &config.user_agent)
    }

    pub fn build_client(timeout: Duration, user_agent: &str) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .gzip(true)
            .build()
    }
}

#[async_trait]
impl PageLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<String, LoadError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(url, "Page fetch timed out");
                return Err(LoadError::Timeout {
                    url: url.to_string(),
                });
            }
            Err(e) => {
                warn!(url, error = %e, "Page fetch network error");
                return Err(LoadError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Page fetch returned error status");
            return Err(LoadError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| LoadError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!(url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader(timeout: Duration) -> HttpLoader {
        HttpLoader::new(timeout, "test-agent/1.0").unwrap()
    }

    #[tokio::test]
    async fn load_returns_body_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/event"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Teilnehmer: 44"))
            .mount(&server)
            .await;

        let body = loader(Duration::from_secs(5))
            .load(&format!("{}/event", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "Teilnehmer: 44");
    }

    #[tokio::test]
    async fn load_sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "test-agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let result = loader(Duration::from_secs(5)).load(&server.uri()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn load_returns_error_on_404_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = loader(Duration::from_secs(5))
            .load(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn load_returns_error_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = loader(Duration::from_secs(5)).load(&server.uri()).await.unwrap_err();
        assert!(matches!(err, LoadError::Http { status: 500, .. }));
    }

    #[tokio::test]
    async fn load_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = loader(Duration::from_millis(200))
            .load(&server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Timeout { .. }), "{err}");
    }

    #[tokio::test]
    async fn load_reports_network_error_for_unreachable_host() {
        let err = loader(Duration::from_secs(2))
            .load("http://127.0.0.1:1/event")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Network { .. }), "{err}");
        assert_eq!(err.status_code(), None);
    }
}
