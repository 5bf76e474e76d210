use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LudexError;

// ─── MatchKind ─────────────────────────────────────────────

/// How two titles matched. Stored as a lowercase string in SQLite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Prefix,
    Suffix,
    Contains,
    Fuzzy,
    /// Recognized franchise numbering (e.g. "Portal" / "Portal 2") —
    /// related titles, not duplicates. Never persisted as a pair.
    Sequel,
    #[default]
    None,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Contains => "contains",
            Self::Fuzzy => "fuzzy",
            Self::Sequel => "sequel",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

impl FromStr for MatchKind {
    type Err = LudexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "prefix" => Ok(Self::Prefix),
            "suffix" => Ok(Self::Suffix),
            "contains" => Ok(Self::Contains),
            "fuzzy" => Ok(Self::Fuzzy),
            "sequel" => Ok(Self::Sequel),
            "none" => Ok(Self::None),
            other => Err(LudexError::ValidationError(format!(
                "unknown match kind: {other}"
            ))),
        }
    }
}

// ─── PairKey ───────────────────────────────────────────────

/// Canonical storage key for an unordered title pair: the smaller id
/// always comes first, so `(a, b)` and `(b, a)` address the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    a: Uuid,
    b: Uuid,
}

impl PairKey {
    pub fn new(x: Uuid, y: Uuid) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }

    pub fn first(&self) -> Uuid {
        self.a
    }

    pub fn second(&self) -> Uuid {
        self.b
    }
}

// ─── SimilarityPair ────────────────────────────────────────

/// A stored similarity pair between two titles of one owner.
///
/// Member ids are kept in canonical order (`title_a_id < title_b_id`).
/// The `dismissed` flag belongs to the user and survives rescans; only
/// score and match kind are rewritten when names change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub id: Uuid,
    pub title_a_id: Uuid,
    pub title_b_id: Uuid,
    pub owner_id: Uuid,
    pub score: u8,
    pub match_type: MatchKind,

    #[serde(default)]
    pub dismissed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SimilarityPair {
    /// Create a fresh, undismissed pair for the given canonical key.
    pub fn new(owner_id: Uuid, key: PairKey, score: u8, match_type: MatchKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title_a_id: key.first(),
            title_b_id: key.second(),
            owner_id,
            score,
            match_type,
            dismissed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(self.title_a_id, self.title_b_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_orders_members() {
        let lo = Uuid::from_u128(1);
        let hi = Uuid::from_u128(2);
        assert_eq!(PairKey::new(hi, lo), PairKey::new(lo, hi));
        assert_eq!(PairKey::new(hi, lo).first(), lo);
        assert_eq!(PairKey::new(hi, lo).second(), hi);
    }

    #[test]
    fn new_pair_stores_canonical_order() {
        let owner = Uuid::from_u128(9);
        let lo = Uuid::from_u128(3);
        let hi = Uuid::from_u128(7);
        let pair = SimilarityPair::new(owner, PairKey::new(hi, lo), 80, MatchKind::Fuzzy);
        assert!(pair.title_a_id < pair.title_b_id);
        assert!(!pair.dismissed);
    }

    #[test]
    fn match_kind_round_trips_through_strings() {
        for kind in [
            MatchKind::Exact,
            MatchKind::Prefix,
            MatchKind::Suffix,
            MatchKind::Contains,
            MatchKind::Fuzzy,
            MatchKind::Sequel,
            MatchKind::None,
        ] {
            assert_eq!(kind.to_string().parse::<MatchKind>().unwrap(), kind);
        }
        assert!("banana".parse::<MatchKind>().is_err());
    }
}
