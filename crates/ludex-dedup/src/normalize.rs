use crate::config::SequelPatterns;

/// Canonical comparable form of a title: lower-cased, with every
/// character that is not a letter, digit or whitespace stripped.
/// Whitespace is kept as-is; the result feeds substring comparison.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Token sequence of a title: lower-cased, punctuation replaced with
/// spaces, split on whitespace. "Half-Life 2" → ["half", "life", "2"].
pub fn tokenize(name: &str) -> Vec<String> {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Whether a token is franchise numbering: a roman numeral, a decimal
/// numeral, or a spelled-out cardinal/ordinal.
pub fn is_sequel_token(token: &str, patterns: &SequelPatterns) -> bool {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    patterns.roman_numerals.iter().any(|p| p == token)
        || patterns.spelled_numbers.iter().any(|p| p == token)
}

/// Tokens of a title excluding franchise numbering.
pub fn core_tokens(name: &str, patterns: &SequelPatterns) -> Vec<String> {
    tokenize(name)
        .into_iter()
        .filter(|t| !is_sequel_token(t, patterns))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> SequelPatterns {
        SequelPatterns::default()
    }

    #[test]
    fn normalize_strips_trademark_and_punctuation() {
        assert_eq!(normalize("The Sims™ 4"), "the sims 4");
        assert_eq!(normalize("Half-Life 2"), "halflife 2");
        assert_eq!(normalize("DOOM (1993)"), "doom 1993");
    }

    #[test]
    fn normalize_preserves_internal_whitespace() {
        assert_eq!(normalize("A  B"), "a  b");
    }

    #[test]
    fn tokenize_splits_on_punctuation() {
        assert_eq!(tokenize("Half-Life 2: Episode One"), vec![
            "half", "life", "2", "episode", "one"
        ]);
        assert!(tokenize("™®©").is_empty());
    }

    #[test]
    fn sequel_tokens_cover_all_active_pattern_families() {
        for token in ["2", "1999", "vii", "x", "three", "twelve", "ninth"] {
            assert!(is_sequel_token(token, &patterns()), "{token} should be numbering");
        }
        for token in ["episode", "remastered", "2b", ""] {
            assert!(!is_sequel_token(token, &patterns()), "{token} should be content");
        }
    }

    #[test]
    fn core_tokens_drop_numbering() {
        assert_eq!(core_tokens("Final Fantasy VII", &patterns()), vec![
            "final", "fantasy"
        ]);
        assert_eq!(core_tokens("Half-Life 2: Episode One", &patterns()), vec![
            "half", "life", "episode"
        ]);
    }
}
