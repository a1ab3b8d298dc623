//! Anime source resolution: match a canonical title against a catalog
//! site, list its episodes and resolve an episode to a playable stream.

pub mod provider;

pub use provider::{
    CanonicalTitle, Episode, RawSource, ResolveStrategy, ResolverConfig, ScrapeError,
    SearchResult, SiteRegistry, SourceSite,
};
