use serde::{Deserialize, Serialize};

use ludex_core::DedupSettings;

/// Tokens recognized as franchise numbering rather than distinct content.
///
/// Only numbering is covered: roman numerals, decimal numerals (checked
/// structurally, not listed) and spelled-out cardinals/ordinals. Edition
/// and remaster qualifiers ("deluxe", "remastered", "goty") are a known
/// extension point; they are deliberately not classified as numbering
/// until there is tuning data showing they should be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequelPatterns {
    pub roman_numerals: Vec<String>,
    pub spelled_numbers: Vec<String>,
}

impl Default for SequelPatterns {
    fn default() -> Self {
        Self {
            roman_numerals: [
                "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii", "xiii",
                "xiv", "xv", "xvi", "xvii", "xviii", "xix", "xx",
            ]
            .map(str::to_string)
            .to_vec(),
            spelled_numbers: [
                "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
                "eleven", "twelve", "first", "second", "third", "fourth", "fifth", "sixth",
                "seventh", "eighth", "ninth", "tenth",
            ]
            .map(str::to_string)
            .to_vec(),
        }
    }
}

/// Engine configuration. Explicit values passed into the scorer and
/// reconciler, never module-level constants, so tests can vary them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Minimum score a computed pair needs to be persisted (0–100).
    pub min_similarity_score: u8,
    /// Normalized names shorter than this are too unreliable to compare.
    pub min_normalized_length: usize,
    pub sequel_patterns: SequelPatterns,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_similarity_score: 50,
            min_normalized_length: 4,
            sequel_patterns: SequelPatterns::default(),
        }
    }
}

impl DedupConfig {
    /// Build engine config from the persisted app settings.
    pub fn from_settings(settings: &DedupSettings) -> Self {
        Self {
            min_similarity_score: settings.min_similarity_score.min(100),
            min_normalized_length: settings.min_normalized_length,
            sequel_patterns: SequelPatterns::default(),
        }
    }

    pub fn with_min_score(mut self, score: u8) -> Self {
        self.min_similarity_score = score.min(100);
        self
    }

    pub fn with_min_length(mut self, length: usize) -> Self {
        self.min_normalized_length = length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_app_settings_default() {
        let config = DedupConfig::from_settings(&DedupSettings::default());
        assert_eq!(config.min_similarity_score, 50);
        assert_eq!(config.min_normalized_length, 4);
    }

    #[test]
    fn with_min_score_clamps_to_valid_range() {
        let config = DedupConfig::default().with_min_score(255);
        assert_eq!(config.min_similarity_score, 100);
    }
}
