// Zoro - search, episode listing and source resolution
//
// Direct resolution chains three requests, each keyed by the previous answer:
// server list (pick server "1") → source link → video host extractor.
// The aggregator strategy hands the whole chain to a third-party service.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use crate::provider::config::{ResolveStrategy, ResolverConfig};
use crate::provider::episodes::parse_episode_list;
use crate::provider::errors::{Miss, Result, ScrapeError};
use crate::provider::extractors::{ExtractionContext, ExtractorRegistry};
use crate::provider::matcher::TitleMatcher;
use crate::provider::models::{CanonicalTitle, Episode, RawSource, SearchResult, Subtitles};
use crate::provider::traits::SourceSite;
use crate::provider::transport::{fetch_json, HttpRequest, Transport};

const NAME: &str = "Zoro";

/// `data-server-id` of the server whose links the extractors understand
const PREFERRED_SERVER_ID: &str = "1";

const SEARCH_ITEM_SELECTOR: &str = ".film_list-wrap > div.flw-item";
const SEARCH_TITLE_SELECTOR: &str = ".film-name > a.dynamic-name";
const SEARCH_LINK_SELECTOR: &str = ".film-name > a";
const SERVER_ROW_SELECTOR: &str = "div.ps__-list > div";

#[derive(Debug, Deserialize)]
struct EpisodeListResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    html: String,
}

#[derive(Debug, Deserialize)]
struct ServerListResponse {
    html: String,
}

#[derive(Debug, Deserialize)]
struct SourceLinkResponse {
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregatorWatch {
    #[serde(default)]
    sources: Vec<AggregatorSource>,
    #[serde(default)]
    subtitles: Vec<AggregatorSubtitle>,
    headers: Option<AggregatorHeaders>,
}

#[derive(Debug, Deserialize)]
struct AggregatorSource {
    url: String,
    quality: Option<String>,
    #[serde(rename = "isM3U8", default)]
    is_m3u8: bool,
}

#[derive(Debug, Deserialize)]
struct AggregatorSubtitle {
    lang: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct AggregatorHeaders {
    #[serde(rename = "Referer")]
    referer: Option<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(e.to_string()))
}

pub struct Zoro {
    base_url: String,
    aggregator_url: String,
    decryption_key: Option<String>,
    transport: Arc<dyn Transport>,
    extractors: Arc<ExtractorRegistry>,
    matcher: TitleMatcher,
}

impl Zoro {
    pub fn new(
        config: &ResolverConfig,
        transport: Arc<dyn Transport>,
        extractors: Arc<ExtractorRegistry>,
    ) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            aggregator_url: config.aggregator_url.trim_end_matches('/').to_string(),
            decryption_key: config.decryption_key.clone(),
            transport,
            extractors,
            matcher: TitleMatcher::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: TitleMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Search rows as (title, site path), `ref` tracking parameter dropped
    fn parse_search_results(&self, html: &str) -> Result<Vec<SearchResult>> {
        let base = Url::parse(&self.base_url)?;
        let document = Html::parse_document(html);
        let item_selector = selector(SEARCH_ITEM_SELECTOR)?;
        let title_selector = selector(SEARCH_TITLE_SELECTOR)?;
        let link_selector = selector(SEARCH_LINK_SELECTOR)?;

        let mut results = Vec::new();

        for item in document.select(&item_selector) {
            let title = item
                .select(&title_selector)
                .next()
                .and_then(|a| a.value().attr("title"));
            let href = item
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"));

            let (Some(title), Some(href)) = (title, href) else {
                continue;
            };
            let Ok(url) = base.join(href) else {
                continue;
            };

            results.push(SearchResult::new(title.trim(), url.path()));
        }

        Ok(results)
    }

    /// `data-id` of the first row served by the preferred server
    fn find_server_id(html: &str) -> Result<Option<String>> {
        let document = Html::parse_document(html);
        let row_selector = selector(SERVER_ROW_SELECTOR)?;

        Ok(document
            .select(&row_selector)
            .find(|row| row.value().attr("data-server-id") == Some(PREFERRED_SERVER_ID))
            .and_then(|row| row.value().attr("data-id"))
            .map(str::to_string))
    }

    async fn resolve_direct(&self, reference: &str) -> Result<Option<RawSource>> {
        let page = self.url(reference);
        let page_url = Url::parse(&page)?;

        let Some(episode_id) = page_url
            .query_pairs()
            .find(|(key, _)| key == "ep")
            .map(|(_, value)| value.into_owned())
        else {
            return Ok(Miss::MalformedResponse.log(NAME, reference));
        };

        // Hop 1: server list
        let servers_url = self.url(&format!(
            "/ajax/v2/episode/servers?episodeId={}",
            urlencoding::encode(&episode_id)
        ));
        let request = HttpRequest::get(servers_url).referer(&page);
        let Some(servers) = fetch_json::<ServerListResponse>(self.transport.as_ref(), request).await? else {
            return Ok(None);
        };
        let Some(server_id) = Self::find_server_id(&servers.html)? else {
            return Ok(Miss::NoServerFound.log(NAME, reference));
        };
        tracing::debug!(episode_id = %episode_id, server_id = %server_id, "server selected");

        // Hop 2: source link
        let sources_url = self.url(&format!(
            "/ajax/v2/episode/sources?id={}",
            urlencoding::encode(&server_id)
        ));
        let request = HttpRequest::get(sources_url).referer(&page);
        let Some(source) = fetch_json::<SourceLinkResponse>(self.transport.as_ref(), request).await? else {
            return Ok(None);
        };
        let Some(link) = source.link.filter(|l| !l.trim().is_empty()) else {
            return Ok(Miss::NoSourceFound.log(NAME, reference));
        };
        let Ok(link) = Url::parse(link.trim()) else {
            return Ok(Miss::MalformedResponse.log(NAME, &link));
        };

        // Hop 3: video host
        let Some(extractor) = self.extractors.for_url(&link) else {
            tracing::debug!(host = ?link.host_str(), "no extractor for video host");
            return Ok(Miss::NoSourceFound.log(NAME, reference));
        };
        let context = ExtractionContext::new(page.clone()).with_decryption_key(self.decryption_key.clone());
        let Some(media) = extractor.extract(&link, &context).await? else {
            return Ok(None);
        };
        let Some(primary) = media.primary() else {
            return Ok(Miss::NoSourceFound.log(NAME, reference));
        };

        tracing::info!(site = NAME, extractor = extractor.name(), reference, "source resolved");

        Ok(Some(RawSource {
            video: primary.url.clone(),
            m3u8: media.m3u8().map(|s| s.url.clone()),
            subtitle: (!media.subtitles.is_empty()).then(|| Subtitles::Tracks(media.subtitles.clone())),
            // Players must replay the host's required Referer
            referer: Some(media.headers.get("Referer").cloned().unwrap_or(page)),
            browser: true,
        }))
    }

    /// Episode reference in the aggregator's id format
    fn aggregator_episode_id(reference: &str) -> String {
        reference.replace("/watch/", "").replace("?ep=", "$episode$")
    }

    async fn resolve_aggregator(&self, reference: &str) -> Result<Option<RawSource>> {
        let episode_id = Self::aggregator_episode_id(reference);
        let watch_url = format!(
            "{}/watch?episodeId={}",
            self.aggregator_url,
            urlencoding::encode(&episode_id)
        );

        let Some(watch) = fetch_json::<AggregatorWatch>(self.transport.as_ref(), HttpRequest::get(watch_url)).await? else {
            return Ok(None);
        };

        let Some(primary) = watch
            .sources
            .into_iter()
            .find(|s| s.quality.as_deref() == Some("auto"))
        else {
            return Ok(Miss::NoSourceFound.log(NAME, reference));
        };

        let subtitle = watch
            .subtitles
            .into_iter()
            .find(|s| s.lang.trim().eq_ignore_ascii_case("english"))
            .map(|s| Subtitles::Single(s.url));

        tracing::info!(site = NAME, reference, "source resolved through aggregator");

        Ok(Some(RawSource {
            m3u8: primary.is_m3u8.then(|| primary.url.clone()),
            video: primary.url,
            subtitle,
            referer: watch.headers.and_then(|h| h.referer),
            browser: true,
        }))
    }
}

#[async_trait]
impl SourceSite for Zoro {
    fn name(&self) -> &'static str {
        NAME
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn priority(&self) -> u8 {
        2
    }

    fn supports_subtitles(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = self.url(&format!("/search?keyword={}", urlencoding::encode(query)));
        let html = self.transport.fetch(HttpRequest::get(url)).await?;
        self.parse_search_results(&html)
    }

    async fn find_match(&self, title: &CanonicalTitle) -> Result<Option<SearchResult>> {
        let Some(query) = title.search_query() else {
            return Ok(Miss::NoMatch.log(NAME, "<untitled>"));
        };

        let results = self.search(query).await?;
        if results.is_empty() {
            return Ok(Miss::NoMatch.log(NAME, query));
        }

        match self.matcher.find_with_tier(&results, title) {
            Some((result, tier)) => {
                tracing::debug!(query, path = %result.path, ?tier, "title matched");
                Ok(Some(result.clone()))
            }
            None => Ok(Miss::NoMatch.log(NAME, query)),
        }
    }

    async fn list_episodes(
        &self,
        series_path: &str,
        excluded: &HashSet<u32>,
    ) -> Result<Option<Vec<Episode>>> {
        let series_path = series_path.trim_end_matches('/');
        let series_id = series_path.rsplit('-').next().unwrap_or_default();
        if series_id.is_empty() {
            return Ok(Miss::MalformedResponse.log(NAME, series_path));
        }

        let request = HttpRequest::get(self.url(&format!("/ajax/v2/episode/list/{}", series_id)))
            .xhr()
            .referer(self.url(&format!("/watch{}", series_path)))
            .proxied();

        let Some(listing) = fetch_json::<EpisodeListResponse>(self.transport.as_ref(), request).await? else {
            return Ok(None);
        };
        if !listing.status {
            return Ok(Miss::MalformedResponse.log(NAME, series_path));
        }

        let episodes = parse_episode_list(&listing.html, excluded)?;
        tracing::debug!(series_path, count = episodes.len(), "episodes listed");
        Ok(Some(episodes))
    }

    async fn resolve_source(
        &self,
        episode_reference: &str,
        strategy: ResolveStrategy,
    ) -> Result<Option<RawSource>> {
        tracing::debug!(site = NAME, reference = episode_reference, %strategy, "resolving source");
        match strategy {
            ResolveStrategy::Direct => self.resolve_direct(episode_reference).await,
            ResolveStrategy::Aggregator => self.resolve_aggregator(episode_reference).await,
        }
    }
}
