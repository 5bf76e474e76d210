use std::collections::HashSet;

use ludex_core::MatchKind;

use crate::config::DedupConfig;
use crate::normalize::{core_tokens, is_sequel_token, normalize, tokenize};

/// Result of scoring one unordered title pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub score: u8,
    pub kind: MatchKind,
}

impl MatchScore {
    fn new(score: u8, kind: MatchKind) -> Self {
        Self { score, kind }
    }

    fn none() -> Self {
        Self::new(0, MatchKind::None)
    }

    fn sequel() -> Self {
        Self::new(0, MatchKind::Sequel)
    }
}

/// Tiered similarity heuristic over two title names.
///
/// Tiers, first applicable wins: exact normalized equality, a too-short
/// guard, substring containment (prefix/suffix/middle, with
/// numbering-only suffixes classified as sequels), then token overlap.
/// Approximates edit-distance confidence without full alignment.
pub struct SimilarityScorer {
    config: DedupConfig,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(DedupConfig::default())
    }
}

impl SimilarityScorer {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Score two raw title names. Symmetric: swapping the arguments never
    /// changes the result — containment direction comes from ordering the
    /// normalized strings by length.
    pub fn score(&self, a: &str, b: &str) -> MatchScore {
        let norm_a = normalize(a);
        let norm_b = normalize(b);

        if norm_a == norm_b {
            return MatchScore::new(100, MatchKind::Exact);
        }

        let len_a = norm_a.chars().count();
        let len_b = norm_b.chars().count();
        if len_a < self.config.min_normalized_length || len_b < self.config.min_normalized_length {
            return MatchScore::none();
        }

        let (shorter, longer, len_short, len_long) = if len_a <= len_b {
            (&norm_a, &norm_b, len_a, len_b)
        } else {
            (&norm_b, &norm_a, len_b, len_a)
        };

        if longer.contains(shorter.as_str()) {
            let ratio = len_short as f64 / len_long as f64;

            if let Some(rest) = longer.strip_prefix(shorter.as_str()) {
                // "Portal" / "Portal 2": a numbering-only remainder means
                // a sequel, not a naming duplicate.
                let numbering_only = tokenize(rest)
                    .iter()
                    .all(|t| is_sequel_token(t, &self.config.sequel_patterns));
                if numbering_only {
                    return MatchScore::sequel();
                }
                return MatchScore::new(round(70.0 + 25.0 * ratio), MatchKind::Prefix);
            }
            if longer.ends_with(shorter.as_str()) {
                return MatchScore::new(round(50.0 + 30.0 * ratio), MatchKind::Suffix);
            }
            return MatchScore::new(round(40.0 + 20.0 * ratio), MatchKind::Contains);
        }

        self.token_overlap(a, b)
    }

    /// Tier for titles where neither normalized name contains the other:
    /// compare token sets, with numbering stripped for the core measure.
    fn token_overlap(&self, a: &str, b: &str) -> MatchScore {
        let patterns = &self.config.sequel_patterns;

        let full_a: HashSet<String> = tokenize(a).into_iter().collect();
        let full_b: HashSet<String> = tokenize(b).into_iter().collect();
        if full_a.is_empty() || full_b.is_empty() {
            return MatchScore::none();
        }

        let core_a: HashSet<String> = core_tokens(a, patterns).into_iter().collect();
        let core_b: HashSet<String> = core_tokens(b, patterns).into_iter().collect();

        let intersection = core_a.intersection(&core_b).count();
        let union = core_a.union(&core_b).count();
        let jaccard = if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        };

        if core_a.is_subset(&core_b) || core_b.is_subset(&core_a) {
            // One title's content nests in the other's. If the tokens they
            // don't share are all numbering, this is franchise structure
            // ("Final Fantasy X" / "Final Fantasy 10"), not a duplicate.
            let numbering_only = full_a
                .symmetric_difference(&full_b)
                .all(|t| is_sequel_token(t, patterns));
            if numbering_only {
                return MatchScore::sequel();
            }
            return MatchScore::new(round(60.0 + 30.0 * jaccard), MatchKind::Fuzzy);
        }

        if jaccard >= 0.5 {
            return MatchScore::new(round(jaccard * 70.0), MatchKind::Fuzzy);
        }

        MatchScore::none()
    }
}

fn round(value: f64) -> u8 {
    value.round() as u8
}
