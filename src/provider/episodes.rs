// Episode listing: markup parsing, exclusion and title deduplication

use regex::Regex;
use scraper::{CaseSensitivity, Html, Selector};
use std::collections::HashSet;

use super::errors::{Result, ScrapeError};
use super::models::Episode;
use super::title::clean;

lazy_static::lazy_static! {
    static ref PLACEHOLDER_TITLE_RE: Regex = Regex::new(r"^Episode\s+\d+$").unwrap();
}

const EPISODE_ITEM_SELECTOR: &str = "div.detail-infor-content > div > a";
const FILLER_CLASS: &str = "ssl-item-filler";

/// Parse listing markup into episodes, in document order.
///
/// Entries whose number is excluded or unparsable are dropped. Placeholder
/// titles are normalized away and repeated titles cleared.
pub fn parse_episode_list(html: &str, excluded: &HashSet<u32>) -> Result<Vec<Episode>> {
    let document = Html::parse_document(html);
    let item_selector =
        Selector::parse(EPISODE_ITEM_SELECTOR).map_err(|e| ScrapeError::Parse(e.to_string()))?;

    let mut episodes = Vec::new();

    for item in document.select(&item_selector) {
        let element = item.value();

        let Some(number) = element
            .attr("data-number")
            .and_then(|n| n.trim().parse::<u32>().ok())
        else {
            tracing::debug!(html = %item.html(), "skipping episode without a number");
            continue;
        };
        if excluded.contains(&number) {
            continue;
        }

        episodes.push(Episode {
            number,
            title: normalize_title(element.attr("title")),
            filler: element.has_class(FILLER_CLASS, CaseSensitivity::CaseSensitive),
            url: element.attr("href").unwrap_or_default().to_string(),
        });
    }

    clear_repeated_titles(&mut episodes);
    Ok(episodes)
}

/// Blank and "Episode 12"-style titles carry no information
fn normalize_title(title: Option<&str>) -> Option<String> {
    let title = title?.trim();
    if title.is_empty() || PLACEHOLDER_TITLE_RE.is_match(title) {
        return None;
    }
    Some(title.to_string())
}

/// Among episodes sharing a title, only the earliest keeps it.
///
/// Sites reuse the series name as the title of every episode of some shows;
/// a title seen before is treated as one of those. Titles are compared in
/// cleaned form, so case and punctuation differences still count as repeats.
pub fn clear_repeated_titles(episodes: &mut [Episode]) {
    let mut seen: HashSet<String> = HashSet::new();

    for episode in episodes.iter_mut() {
        let Some(title) = episode.title.as_deref() else {
            continue;
        };
        if !seen.insert(clean(title)) {
            episode.title = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(items: &[(u32, &str, bool)]) -> String {
        let anchors: String = items
            .iter()
            .map(|(number, title, filler)| {
                format!(
                    r#"<a class="ssl-item ep-item{}" data-number="{}" data-id="{}" title="{}" href="/watch/show-100?ep={}"></a>"#,
                    if *filler { " ssl-item-filler" } else { "" },
                    number,
                    1000 + number,
                    title,
                    1000 + number
                )
            })
            .collect();
        format!(
            r#"<div class="detail-infor-content"><div class="ss-list">{}</div></div>"#,
            anchors
        )
    }

    fn titles(episodes: &[Episode]) -> Vec<Option<&str>> {
        episodes.iter().map(|e| e.title.as_deref()).collect()
    }

    #[test]
    fn test_parses_entries() {
        let html = listing(&[(1, "Romance Dawn", false), (2, "Beach Episode", true)]);

        let episodes = parse_episode_list(&html, &HashSet::new()).unwrap();

        assert_eq!(
            episodes,
            vec![
                Episode {
                    number: 1,
                    title: Some("Romance Dawn".to_string()),
                    filler: false,
                    url: "/watch/show-100?ep=1001".to_string(),
                },
                Episode {
                    number: 2,
                    title: Some("Beach Episode".to_string()),
                    filler: true,
                    url: "/watch/show-100?ep=1002".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_repeated_titles_keep_only_first() {
        let html = listing(&[(1, "Foo", false), (2, "Foo", false), (3, "Foo", false)]);

        let episodes = parse_episode_list(&html, &HashSet::new()).unwrap();

        assert_eq!(titles(&episodes), vec![Some("Foo"), None, None]);
    }

    #[test]
    fn test_interleaved_repeats_are_cleared() {
        let html = listing(&[(1, "A", false), (2, "B", false), (3, "A", false), (4, "B", false)]);

        let episodes = parse_episode_list(&html, &HashSet::new()).unwrap();

        assert_eq!(titles(&episodes), vec![Some("A"), Some("B"), None, None]);
    }

    #[test]
    fn test_placeholder_title_becomes_absent() {
        let html = listing(&[(7, "Episode 7", false), (8, "Episode of Luffy", false)]);

        let episodes = parse_episode_list(&html, &HashSet::new()).unwrap();

        assert_eq!(titles(&episodes), vec![None, Some("Episode of Luffy")]);
    }

    #[test]
    fn test_excluded_numbers_dropped_anywhere() {
        let html = listing(&[(1, "One", false), (2, "Two", false), (3, "Three", false), (4, "Four", false)]);
        let excluded: HashSet<u32> = [1, 3, 4].into_iter().collect();

        let episodes = parse_episode_list(&html, &excluded).unwrap();

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].number, 2);
    }

    #[test]
    fn test_unnumbered_entries_skipped() {
        let html = r#"<div class="detail-infor-content"><div>
            <a data-number="x" title="Broken" href="/a"></a>
            <a data-number="5" title="Fine" href="/b"></a>
        </div></div>"#;

        let episodes = parse_episode_list(html, &HashSet::new()).unwrap();

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].number, 5);
    }

    #[test]
    fn test_missing_titles_do_not_count_as_repeats() {
        let mut episodes = vec![
            Episode { number: 1, title: None, filler: false, url: String::new() },
            Episode { number: 2, title: None, filler: false, url: String::new() },
            Episode { number: 3, title: Some("X".to_string()), filler: false, url: String::new() },
        ];

        clear_repeated_titles(&mut episodes);

        assert_eq!(titles(&episodes), vec![None, None, Some("X")]);
    }

    #[test]
    fn test_repeats_compared_in_cleaned_form() {
        let mut episodes = vec![
            Episode { number: 1, title: Some("Foo!".to_string()), filler: false, url: String::new() },
            Episode { number: 2, title: Some("foo".to_string()), filler: false, url: String::new() },
            Episode { number: 3, title: Some("Foo, Again".to_string()), filler: false, url: String::new() },
        ];

        clear_repeated_titles(&mut episodes);

        assert_eq!(titles(&episodes), vec![Some("Foo!"), None, Some("Foo, Again")]);
    }
}
