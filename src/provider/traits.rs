// Source site trait definition

use async_trait::async_trait;
use std::collections::HashSet;

use super::config::ResolveStrategy;
use super::errors::Result;
use super::models::{CanonicalTitle, Episode, RawSource, SearchResult};

/// A catalog site that can be searched, listed and resolved.
///
/// Every method returns `Ok(None)` for an expected absence and `Err` only
/// for faults.
#[async_trait]
pub trait SourceSite: Send + Sync {
    /// Name of the site (for logging and lookup)
    fn name(&self) -> &'static str;

    fn base_url(&self) -> &str;

    /// Lower is tried first by callers that walk several sites
    fn priority(&self) -> u8 {
        u8::MAX
    }

    /// Whether resolved sources may carry subtitles
    fn supports_subtitles(&self) -> bool {
        false
    }

    fn is_enabled(&self) -> bool {
        true
    }

    /// Site only supplies catalog metadata and never resolves sources
    fn is_info_only(&self) -> bool {
        false
    }

    /// Raw search results for a query, in site order
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Catalog entry that best corresponds to `title`
    async fn find_match(&self, title: &CanonicalTitle) -> Result<Option<SearchResult>>;

    /// Episodes of the entry at `series_path`, without excluded numbers
    async fn list_episodes(
        &self,
        series_path: &str,
        excluded: &HashSet<u32>,
    ) -> Result<Option<Vec<Episode>>>;

    /// Playable source for an episode reference
    async fn resolve_source(
        &self,
        episode_reference: &str,
        strategy: ResolveStrategy,
    ) -> Result<Option<RawSource>>;
}
