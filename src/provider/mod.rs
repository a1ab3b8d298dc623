// Provider module - title matching, episode listing and source resolution

pub mod config;
pub mod episodes;
pub mod errors;
pub mod extractors;
pub mod matcher;
pub mod models;
pub mod orchestrator;
pub mod sites;
pub mod title;
pub mod traits;
pub mod transport;

pub use config::{ResolveStrategy, ResolverConfig};
pub use episodes::{clear_repeated_titles, parse_episode_list};
pub use errors::{Miss, Result, ScrapeError};
pub use extractors::{ExtractionContext, ExtractorRegistry, VideoExtractor};
pub use matcher::{MatchTier, TitleMatcher};
pub use models::{
    CanonicalTitle, Episode, ExtractedMedia, RawSource, ResolvedVideo, SearchResult, SubtitleTrack,
    Subtitles,
};
pub use orchestrator::{fallback_order, resolve_with_fallback, SiteRegistry};
pub use sites::Zoro;
pub use traits::SourceSite;
pub use transport::{HttpRequest, ReqwestTransport, Transport};
