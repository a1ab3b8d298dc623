// TitleMatcher - picks the catalog entry for a multi-variant title
//
// Site search ranking is not reliable by relevance, and sibling entries are
// named inconsistently (a sequel may use romaji where the first season used
// english). Three tiers, cheapest first:
// 1. Fast path: every variant against the first result only
// 2. Broad scan: every variant against every result
// 3. Fuzzy pick: best similarity across all variants, accepted only if it
//    survives a strict re-check

use std::sync::Arc;

use super::models::{CanonicalTitle, SearchResult};
use super::title::{clean, deep_match, DiceSimilarity, MatchMode, Similarity, STRICT_THRESHOLD};

/// Which tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    FastPath,
    BroadScan,
    FuzzyPick,
}

pub struct TitleMatcher {
    similarity: Arc<dyn Similarity>,
}

impl TitleMatcher {
    pub fn new(similarity: Arc<dyn Similarity>) -> Self {
        Self { similarity }
    }

    /// Best entry for `title`, or `None` when nothing qualifies
    pub fn find<'a>(
        &self,
        results: &'a [SearchResult],
        title: &CanonicalTitle,
    ) -> Option<&'a SearchResult> {
        self.find_with_tier(results, title).map(|(result, _)| result)
    }

    pub fn find_with_tier<'a>(
        &self,
        results: &'a [SearchResult],
        title: &CanonicalTitle,
    ) -> Option<(&'a SearchResult, MatchTier)> {
        let first = results.first()?;

        if self.fast_path(first, title) {
            return Some((first, MatchTier::FastPath));
        }
        if let Some(result) = self.broad_scan(results, title) {
            return Some((result, MatchTier::BroadScan));
        }
        self.fuzzy_pick(results, title)
            .map(|result| (result, MatchTier::FuzzyPick))
    }

    fn loose(&self, variant: &str, candidate: &str) -> bool {
        deep_match(self.similarity.as_ref(), variant, candidate, MatchMode::Loose)
    }

    /// First search hit is often right; checking it alone saves the full scan
    fn fast_path(&self, first: &SearchResult, title: &CanonicalTitle) -> bool {
        title.variants().any(|variant| self.loose(variant, &first.title))
    }

    fn broad_scan<'a>(
        &self,
        results: &'a [SearchResult],
        title: &CanonicalTitle,
    ) -> Option<&'a SearchResult> {
        for variant in title.variants() {
            if let Some(result) = results.iter().find(|r| self.loose(variant, &r.title)) {
                return Some(result);
            }
        }
        None
    }

    fn fuzzy_pick<'a>(
        &self,
        results: &'a [SearchResult],
        title: &CanonicalTitle,
    ) -> Option<&'a SearchResult> {
        let cleaned: Vec<String> = results.iter().map(|r| clean(&r.title)).collect();

        let mut highest_rating = 0.0_f64;
        let mut highest: Option<(&str, &'a SearchResult)> = None;

        for variant in title.variants() {
            let Some(best) = self.similarity.best_match(&clean(variant), &cleaned) else {
                continue;
            };
            if best.rating > highest_rating {
                highest_rating = best.rating;
                highest = Some((variant, &results[best.index]));
            }
        }

        let (variant, entry) = highest?;
        tracing::debug!(
            variant,
            candidate = %entry.title,
            rating = highest_rating,
            "best fuzzy candidate"
        );

        let strict = MatchMode::Strict {
            threshold: STRICT_THRESHOLD,
        };
        deep_match(self.similarity.as_ref(), variant, &entry.title, strict).then_some(entry)
    }
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self::new(Arc::new(DiceSimilarity))
    }
}
