// Resolver configuration and strategy selection

use std::fmt;
use std::str::FromStr;

use url::Url;

use super::errors::{Result, ScrapeError};

pub const DEFAULT_BASE_URL: &str = "https://zoro.to";
pub const DEFAULT_AGGREGATOR_URL: &str = "https://api.consumet.org/anime/zoro";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// How a source is resolved for an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveStrategy {
    /// Server list → source link → extractor, against the site itself
    #[default]
    Direct,
    /// Hand the whole resolution to the third-party aggregator
    Aggregator,
}

impl fmt::Display for ResolveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Aggregator => write!(f, "aggregator"),
        }
    }
}

impl FromStr for ResolveStrategy {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "aggregator" | "consumet" => Ok(Self::Aggregator),
            other => Err(ScrapeError::Config(format!("unknown strategy '{}'", other))),
        }
    }
}

/// Configuration shared by sites, extractors and the HTTP transport
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Site root, without trailing slash
    pub base_url: String,
    /// Aggregator service root used by the passthrough strategy
    pub aggregator_url: String,
    /// Secret for the video host's payload obfuscation
    pub decryption_key: Option<String>,
    /// SOCKS5/HTTP proxy for proxied requests
    pub proxy: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub strategy: ResolveStrategy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            aggregator_url: DEFAULT_AGGREGATOR_URL.to_string(),
            decryption_key: None,
            proxy: None,
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            strategy: ResolveStrategy::Direct,
        }
    }
}

impl ResolverConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_aggregator_url(mut self, url: impl Into<String>) -> Self {
        self.aggregator_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_decryption_key(mut self, key: Option<String>) -> Self {
        self.decryption_key = key;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Defaults overridden by `ANIME_SOURCE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = var("ANIME_SOURCE_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(url) = var("ANIME_SOURCE_AGGREGATOR_URL") {
            config = config.with_aggregator_url(url);
        }
        if let Some(key) = var("ANIME_SOURCE_DECRYPTION_KEY") {
            config = config.with_decryption_key(Some(key));
        }
        if let Some(proxy) = var("ANIME_SOURCE_PROXY") {
            config = config.with_proxy(Some(proxy));
        }
        if let Some(timeout) = var("ANIME_SOURCE_TIMEOUT") {
            let seconds = timeout.trim().parse::<u64>().map_err(|_| {
                ScrapeError::Config(format!("ANIME_SOURCE_TIMEOUT is not a number: {}", timeout))
            })?;
            config = config.with_timeout(seconds);
        }
        if let Some(user_agent) = var("ANIME_SOURCE_USER_AGENT") {
            config = config.with_user_agent(user_agent);
        }
        if let Some(strategy) = var("ANIME_SOURCE_STRATEGY") {
            config = config.with_strategy(strategy.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that configured endpoints are absolute URLs
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("base_url", &self.base_url),
            ("aggregator_url", &self.aggregator_url),
        ] {
            Url::parse(value)
                .map_err(|e| ScrapeError::Config(format!("{} '{}': {}", name, value, e)))?;
        }
        if self.timeout_seconds == 0 {
            return Err(ScrapeError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy, ResolveStrategy::Direct);
        assert!(config.decryption_key.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = ResolverConfig::from_lookup(lookup(&[
            ("ANIME_SOURCE_BASE_URL", "https://mirror.example.org/"),
            ("ANIME_SOURCE_DECRYPTION_KEY", "secret"),
            ("ANIME_SOURCE_TIMEOUT", "12"),
            ("ANIME_SOURCE_STRATEGY", "Aggregator"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://mirror.example.org");
        assert_eq!(config.decryption_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout_seconds, 12);
        assert_eq!(config.strategy, ResolveStrategy::Aggregator);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = ResolverConfig::from_lookup(lookup(&[("ANIME_SOURCE_TIMEOUT", "soon")]));
        assert!(matches!(err, Err(ScrapeError::Config(_))));

        let err = ResolverConfig::from_lookup(lookup(&[("ANIME_SOURCE_STRATEGY", "magic")]));
        assert!(matches!(err, Err(ScrapeError::Config(_))));

        let err = ResolverConfig::from_lookup(lookup(&[("ANIME_SOURCE_BASE_URL", "zoro")]));
        assert!(matches!(err, Err(ScrapeError::Config(_))));
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for strategy in [ResolveStrategy::Direct, ResolveStrategy::Aggregator] {
            assert_eq!(strategy.to_string().parse::<ResolveStrategy>().unwrap(), strategy);
        }
    }
}
