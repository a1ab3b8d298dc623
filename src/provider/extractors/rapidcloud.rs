// RapidCloud extractor - embed id → getSources ajax → (decrypt) → sources
//
// The host answers with either a plain source list or, when `encrypted` is
// set, a CryptoJS passphrase blob that decrypts to the same list. The key is
// rotated by the host and must come from configuration.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

use super::crypto::decrypt_passphrase;
use super::traits::{ExtractionContext, VideoExtractor};
use crate::provider::errors::{Miss, Result, ScrapeError};
use crate::provider::models::{ExtractedMedia, ResolvedVideo, SubtitleTrack};
use crate::provider::transport::{fetch_json, HttpRequest, Transport};

const NAME: &str = "RapidCloud";
const HOSTS: &[&str] = &["rapid-cloud.co", "rapid-cloud.ru", "rabbitstream.net"];

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    sources: Option<EmbedSources>,
    #[serde(default)]
    tracks: Vec<EmbedTrack>,
    #[serde(default)]
    encrypted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbedSources {
    Encrypted(String),
    Plain(Vec<EmbedSource>),
}

#[derive(Debug, Deserialize)]
struct EmbedSource {
    file: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedTrack {
    file: Option<String>,
    label: Option<String>,
    kind: Option<String>,
}

pub struct RapidCloud {
    transport: Arc<dyn Transport>,
}

impl RapidCloud {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn sources_url(video_url: &Url) -> Option<String> {
        let host = video_url.host_str()?;
        let id = video_url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()?;
        Some(format!(
            "{}://{}/embed-2/ajax/e-1/getSources?id={}",
            video_url.scheme(),
            host,
            id
        ))
    }

    fn decode_sources(
        sources: EmbedSources,
        context: &ExtractionContext,
    ) -> Result<Option<Vec<EmbedSource>>> {
        match sources {
            EmbedSources::Plain(list) => Ok(Some(list)),
            EmbedSources::Encrypted(blob) => {
                let key = context.decryption_key.as_deref().ok_or_else(|| {
                    ScrapeError::Config(format!("{} sources are encrypted but no decryption key is configured", NAME))
                })?;
                let plaintext = decrypt_passphrase(&blob, key)?;
                match serde_json::from_str(&plaintext) {
                    Ok(list) => Ok(Some(list)),
                    Err(e) => {
                        tracing::warn!(error = %e, "decrypted payload is not a source list");
                        Ok(None)
                    }
                }
            }
        }
    }

    fn to_video(source: EmbedSource) -> ResolvedVideo {
        let is_m3u8 = source.kind.as_deref() == Some("hls") || source.file.contains(".m3u8");
        ResolvedVideo {
            quality: is_m3u8.then(|| "auto".to_string()),
            url: source.file,
            is_m3u8,
        }
    }

    fn to_subtitle(track: EmbedTrack) -> Option<SubtitleTrack> {
        if track.kind.as_deref() == Some("thumbnails") {
            return None;
        }
        Some(SubtitleTrack {
            language: track.label.unwrap_or_else(|| "Unknown".to_string()),
            url: track.file?,
        })
    }
}

#[async_trait]
impl VideoExtractor for RapidCloud {
    fn name(&self) -> &'static str {
        NAME
    }

    fn hosts(&self) -> &[&'static str] {
        HOSTS
    }

    async fn extract(
        &self,
        video_url: &Url,
        context: &ExtractionContext,
    ) -> Result<Option<ExtractedMedia>> {
        let Some(sources_url) = Self::sources_url(video_url) else {
            return Ok(Miss::MalformedResponse.log(NAME, video_url.as_str()));
        };

        let request = HttpRequest::get(&sources_url)
            .xhr()
            .referer(&context.referer)
            .headers(context.headers.iter().cloned());

        let Some(response) = fetch_json::<SourcesResponse>(self.transport.as_ref(), request).await? else {
            return Ok(None);
        };
        tracing::debug!(url = %sources_url, encrypted = response.encrypted, "fetched embed sources");

        let Some(sources) = response.sources else {
            return Ok(Miss::NoSourceFound.log(NAME, &sources_url));
        };
        let Some(sources) = Self::decode_sources(sources, context)? else {
            return Ok(Miss::MalformedResponse.log(NAME, &sources_url));
        };

        let sources: Vec<ResolvedVideo> = sources.into_iter().map(Self::to_video).collect();
        if sources.is_empty() {
            return Ok(Miss::NoSourceFound.log(NAME, &sources_url));
        }

        let subtitles = response
            .tracks
            .into_iter()
            .filter_map(Self::to_subtitle)
            .collect();

        let mut headers = BTreeMap::new();
        headers.insert("Referer".to_string(), context.referer.clone());

        Ok(Some(ExtractedMedia {
            sources,
            subtitles,
            headers,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::extractors::crypto::{FIXTURE, FIXTURE_KEY};
    use crate::provider::transport::testing::MockTransport;

    const EMBED: &str = "https://rapid-cloud.co/embed-6/AbCdEf123?z=";
    const SOURCES: &str = "https://rapid-cloud.co/embed-2/ajax/e-1/getSources?id=AbCdEf123";
    const PAGE: &str = "https://zoro.to/watch/frieren-18542?ep=107257";

    fn extractor(transport: MockTransport) -> (Arc<MockTransport>, RapidCloud) {
        let transport = Arc::new(transport);
        (transport.clone(), RapidCloud::new(transport))
    }

    #[test]
    fn test_sources_url_uses_last_segment() {
        let url = Url::parse(EMBED).unwrap();
        assert_eq!(RapidCloud::sources_url(&url).as_deref(), Some(SOURCES));
    }

    #[tokio::test]
    async fn test_plain_sources_and_tracks() {
        let body = r#"{
            "sources": [{"file": "https://cdn.example.net/a/master.m3u8", "type": "hls"}],
            "tracks": [
                {"file": "https://cdn.example.net/a/eng.vtt", "label": "English", "kind": "captions"},
                {"file": "https://cdn.example.net/a/thumbs.vtt", "kind": "thumbnails"}
            ],
            "encrypted": false
        }"#;
        let (transport, extractor) = extractor(MockTransport::new().route(SOURCES, body));
        let context = ExtractionContext::new(PAGE).with_header("Origin", "https://zoro.to");

        let media = extractor
            .extract(&Url::parse(EMBED).unwrap(), &context)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(media.sources.len(), 1);
        assert!(media.sources[0].is_m3u8);
        assert_eq!(media.sources[0].quality.as_deref(), Some("auto"));
        assert_eq!(
            media.subtitles,
            vec![SubtitleTrack {
                language: "English".to_string(),
                url: "https://cdn.example.net/a/eng.vtt".to_string(),
            }]
        );
        assert_eq!(media.headers.get("Referer").map(String::as_str), Some(PAGE));

        let request = transport.request_to(SOURCES).unwrap();
        assert!(request
            .headers
            .contains(&("X-Requested-With".to_string(), "XMLHttpRequest".to_string())));
        assert!(request.headers.contains(&("Referer".to_string(), PAGE.to_string())));
        assert!(request
            .headers
            .contains(&("Origin".to_string(), "https://zoro.to".to_string())));
    }

    #[tokio::test]
    async fn test_encrypted_sources_are_decrypted() {
        let body = format!(r#"{{"sources": "{}", "tracks": [], "encrypted": true}}"#, FIXTURE);
        let (_, extractor) = extractor(MockTransport::new().route(SOURCES, body));
        let context = ExtractionContext::new(PAGE).with_decryption_key(Some(FIXTURE_KEY.to_string()));

        let media = extractor
            .extract(&Url::parse(EMBED).unwrap(), &context)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(media.sources[0].url, "https://cdn.example.net/hls/abc/master.m3u8");
        assert!(media.m3u8().is_some());
    }

    #[tokio::test]
    async fn test_encrypted_sources_without_key_is_config_error() {
        let body = format!(r#"{{"sources": "{}", "encrypted": true}}"#, FIXTURE);
        let (_, extractor) = extractor(MockTransport::new().route(SOURCES, body));

        let result = extractor
            .extract(&Url::parse(EMBED).unwrap(), &ExtractionContext::new(PAGE))
            .await;

        assert!(matches!(result, Err(ScrapeError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_source_list_is_none() {
        let (_, extractor) = extractor(MockTransport::new().route(SOURCES, r#"{"sources": [], "tracks": []}"#));

        let media = extractor
            .extract(&Url::parse(EMBED).unwrap(), &ExtractionContext::new(PAGE))
            .await
            .unwrap();

        assert!(media.is_none());
    }
}
