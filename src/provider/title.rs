// Title normalization, similarity rating and deep matching

/// Strictness of a [`deep_match`] comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchMode {
    /// Equality, or the shorter title appears in the longer one on word
    /// boundaries and the leftover words name no instalment. Never consults
    /// a similarity rating.
    Loose,
    /// Equality or a similarity rating at or above the threshold
    Strict { threshold: f64 },
}

/// Rating threshold used when re-checking a best-effort fuzzy pick
pub const STRICT_THRESHOLD: f64 = 0.95;

/// Cleaned words that set one instalment of a franchise apart from another
const INSTALMENT_MARKERS: &[&str] = &[
    "season", "part", "cour", "movie", "film", "ova", "ona", "special", "specials", "final",
    "ii", "iii", "iv",
];

/// Winner of [`Similarity::best_match`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    /// Index into the candidate list
    pub index: usize,
    pub rating: f64,
}

/// Fuzzy string similarity primitive
pub trait Similarity: Send + Sync {
    /// Closeness of two strings in `[0, 1]`
    fn rate(&self, a: &str, b: &str) -> f64;

    /// Highest-rated candidate; the earliest one wins ties
    fn best_match(&self, query: &str, candidates: &[String]) -> Option<BestMatch> {
        let mut best: Option<BestMatch> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            let rating = self.rate(query, candidate);
            if best.map_or(true, |b| rating > b.rating) {
                best = Some(BestMatch { index, rating });
            }
        }
        best
    }
}

/// Sørensen–Dice coefficient over character bigrams, whitespace ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct DiceSimilarity;

impl Similarity for DiceSimilarity {
    fn rate(&self, a: &str, b: &str) -> f64 {
        strsim::sorensen_dice(a, b)
    }
}

/// Lowercase, turn every non-alphanumeric char into a space, collapse runs.
///
/// Alphanumeric is Unicode-aware so native-script titles survive intact.
pub fn clean(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    replaced
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized near-equality between a query title and a candidate title
pub fn deep_match(similarity: &dyn Similarity, query: &str, candidate: &str, mode: MatchMode) -> bool {
    let query = clean(query);
    let candidate = clean(candidate);

    if query.is_empty() || candidate.is_empty() {
        return false;
    }
    if query == candidate {
        return true;
    }

    match mode {
        MatchMode::Loose => contains_same_instalment(&query, &candidate),
        MatchMode::Strict { threshold } => similarity.rate(&query, &candidate) >= threshold,
    }
}

/// The shorter title occurs in the longer one as a whole-word run, and the
/// words around it carry no instalment marker. Symmetric in its arguments.
/// Both inputs are already cleaned, so words are single-space separated.
fn contains_same_instalment(a: &str, b: &str) -> bool {
    let a: Vec<&str> = a.split(' ').collect();
    let b: Vec<&str> = b.split(' ').collect();
    let (longer, shorter) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    longer
        .windows(shorter.len())
        .enumerate()
        .any(|(start, window)| {
            let end = start + shorter.len();
            window == shorter.as_slice()
                && !longer[..start]
                    .iter()
                    .chain(&longer[end..])
                    .any(|word| is_instalment_marker(word))
        })
}

fn is_instalment_marker(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit()) || INSTALMENT_MARKERS.contains(&word)
}
