// ExtractorRegistry - picks the video extractor for an embed URL by host

use std::sync::Arc;
use url::Url;

use super::rapidcloud::RapidCloud;
use super::traits::VideoExtractor;
use crate::provider::transport::Transport;

/// Extractors selected at runtime by the embed URL's host
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn VideoExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in extractor
    pub fn with_defaults(transport: Arc<dyn Transport>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RapidCloud::new(transport)));
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn VideoExtractor>) {
        tracing::debug!(extractor = extractor.name(), hosts = ?extractor.hosts(), "registered extractor");
        self.extractors.push(extractor);
    }

    /// Extractor whose host list covers the URL's host or one of its parents
    pub fn for_url(&self, url: &Url) -> Option<Arc<dyn VideoExtractor>> {
        let host = url.host_str()?.to_ascii_lowercase();

        self.extractors
            .iter()
            .find(|extractor| {
                extractor
                    .hosts()
                    .iter()
                    .any(|known| host == *known || host.ends_with(&format!(".{}", known)))
            })
            .cloned()
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<dyn VideoExtractor>> {
        self.extractors
            .iter()
            .find(|extractor| extractor.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }
}
