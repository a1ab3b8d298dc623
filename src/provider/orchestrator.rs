// Site registry with strategy fallback

use std::sync::Arc;

use super::config::ResolveStrategy;
use super::errors::{Result, ScrapeError};
use super::models::RawSource;
use super::traits::SourceSite;

pub struct SiteRegistry {
    sites: Vec<Arc<dyn SourceSite>>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self { sites: Vec::new() }
    }

    pub fn register(&mut self, site: Arc<dyn SourceSite>) {
        tracing::debug!(site = site.name(), priority = site.priority(), "registered site");
        self.sites.push(site);
    }

    /// Enabled sites, lowest priority value first; ties keep registration order
    pub fn enabled(&self) -> Vec<Arc<dyn SourceSite>> {
        let mut sites: Vec<_> = self
            .sites
            .iter()
            .filter(|site| site.is_enabled())
            .cloned()
            .collect();
        sites.sort_by_key(|site| site.priority());
        sites
    }

    /// Enabled sites that can resolve sources, in priority order
    pub fn source_sites(&self) -> Vec<Arc<dyn SourceSite>> {
        self.enabled()
            .into_iter()
            .filter(|site| !site.is_info_only())
            .collect()
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<dyn SourceSite>> {
        self.sites
            .iter()
            .find(|site| site.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Strategies tried in order when the caller did not pick one
pub fn fallback_order(preferred: ResolveStrategy) -> [ResolveStrategy; 2] {
    match preferred {
        ResolveStrategy::Direct => [ResolveStrategy::Direct, ResolveStrategy::Aggregator],
        ResolveStrategy::Aggregator => [ResolveStrategy::Aggregator, ResolveStrategy::Direct],
    }
}

/// Try each strategy until one yields a source.
///
/// A fault in one strategy does not stop the next; the last fault is
/// returned only when no strategy produced a source or a clean absence.
pub async fn resolve_with_fallback(
    site: &dyn SourceSite,
    reference: &str,
    strategies: &[ResolveStrategy],
) -> Result<Option<RawSource>> {
    let mut last_error: Option<ScrapeError> = None;
    let mut any_absent = false;

    for &strategy in strategies {
        tracing::debug!(site = site.name(), %strategy, "trying strategy");

        match site.resolve_source(reference, strategy).await {
            Ok(Some(source)) => {
                tracing::info!(site = site.name(), %strategy, "resolved");
                return Ok(Some(source));
            }
            Ok(None) => {
                tracing::debug!(site = site.name(), %strategy, "no source");
                any_absent = true;
            }
            Err(e) => {
                tracing::warn!(site = site.name(), %strategy, error = %e, "strategy failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !any_absent => Err(e),
        _ => Ok(None),
    }
}
