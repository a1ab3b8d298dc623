// Common data models shared by sites and extractors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One work's names across languages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTitle {
    pub english: Option<String>,
    pub romaji: Option<String>,
    pub native: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl CanonicalTitle {
    pub fn english(title: impl Into<String>) -> Self {
        Self {
            english: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_romaji(mut self, title: impl Into<String>) -> Self {
        self.romaji = Some(title.into());
        self
    }

    pub fn with_native(mut self, title: impl Into<String>) -> Self {
        self.native = Some(title.into());
        self
    }

    pub fn with_synonym(mut self, title: impl Into<String>) -> Self {
        self.synonyms.push(title.into());
        self
    }

    /// Present variants in priority order: english, romaji, native, synonyms.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        [&self.english, &self.romaji, &self.native]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .chain(self.synonyms.iter().map(String::as_str))
            .filter(|v| !v.trim().is_empty())
    }

    /// Text used for the site search box
    pub fn search_query(&self) -> Option<&str> {
        self.variants().next()
    }
}

/// Candidate catalog entry from a site search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    /// Site-relative path
    pub path: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub number: u32,
    pub title: Option<String>,
    pub filler: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub language: String,
    pub url: String,
}

/// Subtitle field of a [`RawSource`]: a single file or a full track list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subtitles {
    Single(String),
    Tracks(Vec<SubtitleTrack>),
}

/// Normalized resolution result, whichever strategy produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSource {
    pub video: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m3u8: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<Subtitles>,
    /// Originating page the video host expects as `Referer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// Consumer must replay browser-like request semantics
    pub browser: bool,
}

/// One playable rendition found by an extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVideo {
    pub url: String,
    pub quality: Option<String>,
    pub is_m3u8: bool,
}

/// Everything a single extraction call produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMedia {
    pub sources: Vec<ResolvedVideo>,
    pub subtitles: Vec<SubtitleTrack>,
    /// Headers the consumer must send when fetching the sources
    pub headers: BTreeMap<String, String>,
}

impl ExtractedMedia {
    /// First source, the one handed downstream as the video
    pub fn primary(&self) -> Option<&ResolvedVideo> {
        self.sources.first()
    }

    /// First HLS playlist among the sources
    pub fn m3u8(&self) -> Option<&ResolvedVideo> {
        self.sources.iter().find(|s| s.is_m3u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_priority_order() {
        let title = CanonicalTitle {
            english: Some("Attack on Titan".to_string()),
            romaji: None,
            native: Some("進撃の巨人".to_string()),
            synonyms: vec!["AoT".to_string(), "  ".to_string(), "SnK".to_string()],
        };

        let variants: Vec<&str> = title.variants().collect();
        assert_eq!(variants, vec!["Attack on Titan", "進撃の巨人", "AoT", "SnK"]);
        assert_eq!(title.search_query(), Some("Attack on Titan"));
    }

    #[test]
    fn test_raw_source_skips_absent_fields() {
        let source = RawSource {
            video: "https://cdn.example.net/v.mp4".to_string(),
            m3u8: None,
            subtitle: Some(Subtitles::Single("https://cdn.example.net/en.vtt".to_string())),
            referer: None,
            browser: true,
        };

        let json = serde_json::to_value(&source).unwrap();
        assert!(json.get("m3u8").is_none());
        assert!(json.get("referer").is_none());
        assert_eq!(json["subtitle"], "https://cdn.example.net/en.vtt");
        assert_eq!(json["browser"], true);
    }

    #[test]
    fn test_extracted_media_picks_m3u8() {
        let media = ExtractedMedia {
            sources: vec![
                ResolvedVideo {
                    url: "https://cdn.example.net/v.mp4".to_string(),
                    quality: Some("720p".to_string()),
                    is_m3u8: false,
                },
                ResolvedVideo {
                    url: "https://cdn.example.net/master.m3u8".to_string(),
                    quality: Some("auto".to_string()),
                    is_m3u8: true,
                },
            ],
            ..Default::default()
        };

        assert_eq!(media.primary().unwrap().url, "https://cdn.example.net/v.mp4");
        assert_eq!(media.m3u8().unwrap().url, "https://cdn.example.net/master.m3u8");
    }
}
