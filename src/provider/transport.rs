// HTTP transport seam and its reqwest implementation

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::config::ResolverConfig;
use super::errors::{Miss, Result, ScrapeError};

/// A GET request as seen by a [`Transport`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Route through the anti-blocking path (proxy + browser headers)
    pub proxied: bool,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn referer(self, url: impl Into<String>) -> Self {
        self.header("Referer", url)
    }

    /// Mark the request as an XHR call, which the ajax endpoints require
    pub fn xhr(self) -> Self {
        self.header("X-Requested-With", "XMLHttpRequest")
    }

    pub fn proxied(mut self) -> Self {
        self.proxied = true;
        self
    }
}

/// Fetches response bodies. Timeouts and retries live here, never in callers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<String>;
}

/// Fetch and decode a JSON body; a body that is not the expected JSON is
/// a malformed response, not a fault.
pub async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: HttpRequest,
) -> Result<Option<T>> {
    let url = request.url.clone();
    let body = transport.fetch(request).await?;

    match serde_json::from_str::<T>(&body) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::debug!(%url, error = %e, "response is not the expected JSON");
            Ok(Miss::MalformedResponse.log("transport", &url))
        }
    }
}

/// Browser-like headers sent on proxied requests
const ANTI_BLOCKING_HEADERS: [(&str, &str); 3] = [
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Cache-Control", "no-cache"),
];

/// Production transport backed by two reqwest clients, direct and proxied
pub struct ReqwestTransport {
    direct: reqwest::Client,
    proxied: reqwest::Client,
}

impl ReqwestTransport {
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let builder = || {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .user_agent(config.user_agent.clone())
        };

        let direct = builder().build()?;

        let proxied = match config.proxy.as_deref() {
            Some(proxy_url) => {
                let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                    ScrapeError::Config(format!("invalid proxy '{}': {}", proxy_url, e))
                })?;
                tracing::debug!(proxy = proxy_url, "proxied requests routed through proxy");
                builder().proxy(proxy).build()?
            }
            None => direct.clone(),
        };

        Ok(Self { direct, proxied })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<String> {
        let client = if request.proxied {
            &self.proxied
        } else {
            &self.direct
        };

        let mut builder = client.get(&request.url);
        if request.proxied {
            for (name, value) in ANTI_BLOCKING_HEADERS {
                builder = builder.header(name, value);
            }
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(url = %request.url, proxied = request.proxied, "GET");
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: request.url,
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory transport: exact URL → canned body, every request recorded
    #[derive(Default)]
    pub struct MockTransport {
        routes: HashMap<String, String>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.routes.insert(url.into(), body.into());
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_to(&self, url: &str) -> Option<HttpRequest> {
            self.requests().into_iter().find(|r| r.url == url)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn fetch(&self, request: HttpRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.routes
                .get(&request.url)
                .cloned()
                .ok_or(ScrapeError::Status {
                    url: request.url,
                    status: 404,
                })
        }
    }
}
