// VideoExtractor trait and extraction context

use async_trait::async_trait;
use url::Url;

use crate::provider::errors::Result;
use crate::provider::models::ExtractedMedia;

/// Everything an extractor may need besides the video URL
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// Page that embedded the video; hosts check it against hotlinking
    pub referer: String,
    /// Secret for hosts that obfuscate their source payload
    pub decryption_key: Option<String>,
    /// Extra headers sent with every request to the host
    pub headers: Vec<(String, String)>,
}

impl ExtractionContext {
    pub fn new(referer: impl Into<String>) -> Self {
        Self {
            referer: referer.into(),
            ..Default::default()
        }
    }

    pub fn with_decryption_key(mut self, key: Option<String>) -> Self {
        self.decryption_key = key;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Turns an embed URL of one video host into playable sources.
///
/// Implementations hold no per-call state: the sources found by a call are
/// returned from it, so one instance serves concurrent extractions.
#[async_trait]
pub trait VideoExtractor: Send + Sync {
    /// Name of the video host (for logging and lookup)
    fn name(&self) -> &'static str;

    /// Hostnames served by this extractor; subdomains match too
    fn hosts(&self) -> &[&'static str];

    /// Resolve the embed URL; `Ok(None)` when the host offers no source
    async fn extract(
        &self,
        video_url: &Url,
        context: &ExtractionContext,
    ) -> Result<Option<ExtractedMedia>>;
}
