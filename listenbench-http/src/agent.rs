//! Per-session HTTP agent

use crate::body::RequestBody;
use crate::config::AgentConfig;
use crate::errors::AgentError;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Request, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// HTTP client bound to one session.
///
/// The cookie jar lives outside the client so that
/// [`close_idle_connections`](Agent::close_idle_connections) can swap in a
/// fresh connection pool without losing the session.
#[derive(Debug)]
pub struct Agent {
    config: AgentConfig,
    jar: Arc<Jar>,
    client: RwLock<Client>,
}

/// Fully read response
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl AgentResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn cache_control(&self) -> Option<&str> {
        self.headers
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
    }

    /// Whether `Cache-Control` carries the `private` directive
    pub fn is_cache_private(&self) -> bool {
        self.headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|directive| directive.trim().eq_ignore_ascii_case("private"))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Leading part of the body, for failure descriptors
    pub fn body_prefix(&self, max_chars: usize) -> String {
        String::from_utf8_lossy(&self.body)
            .chars()
            .take(max_chars)
            .collect()
    }
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        let jar = Arc::new(Jar::default());
        let client = build_client(&config, &jar)?;
        Ok(Self {
            config,
            jar,
            client: RwLock::new(client),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn client(&self) -> Client {
        self.client.read().clone()
    }

    /// Prepare a GET request for `path`
    pub fn get(&self, path: &str) -> Result<Request, AgentError> {
        let url = self.config.url_for(path)?;
        Ok(self.client().get(url).build()?)
    }

    /// Prepare a JSON POST request for `path`. `None` sends an empty body.
    pub fn post(&self, path: &str, body: Option<&RequestBody>) -> Result<Request, AgentError> {
        let url = self.config.url_for(path)?;
        let mut builder = self
            .client()
            .post(url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.body(body.payload());
        }
        Ok(builder.build()?)
    }

    /// Execute a prepared request and read the whole body.
    ///
    /// Returns [`AgentError::Cancelled`] as soon as `token` fires; the
    /// in-flight request is dropped.
    pub async fn execute(
        &self,
        token: &CancellationToken,
        request: Request,
    ) -> Result<AgentResponse, AgentError> {
        let client = self.client();
        let method = request.method().clone();
        let url = request.url().path().to_string();

        let send = async move {
            let response = client.execute(request).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, AgentError>(AgentResponse {
                status,
                headers,
                body,
            })
        };

        tokio::select! {
            _ = token.cancelled() => Err(AgentError::Cancelled),
            result = send => {
                match &result {
                    Ok(response) => debug!("{} {} -> {}", method, url, response.status),
                    Err(e) => debug!("{} {} failed: {}", method, url, e),
                }
                result
            }
        }
    }

    /// Drop pooled connections, keeping cookies
    pub fn close_idle_connections(&self) {
        match build_client(&self.config, &self.jar) {
            Ok(client) => *self.client.write() = client,
            Err(e) => warn!("Failed to rebuild HTTP client, keeping old pool: {}", e),
        }
    }
}

fn build_client(config: &AgentConfig, jar: &Arc<Jar>) -> Result<Client, AgentError> {
    Client::builder()
        .cookie_provider(Arc::clone(jar))
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.max_idle_per_host)
        .pool_idle_timeout(config.idle_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(AgentError::Build)
}
