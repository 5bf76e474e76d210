use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use ludex_core::{MatchKind, PairKey, SimilarityPair, Title};

use crate::config::DedupConfig;
use crate::scorer::SimilarityScorer;

/// Rewrite of an existing pair's score and kind. Dismissal is not part
/// of an update; it belongs to the user.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PairUpdate {
    pub id: Uuid,
    pub score: u8,
    pub match_type: MatchKind,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReconcileStats {
    pub titles: usize,
    pub pairs_scored: usize,
    /// Computed pairs that cleared the threshold this pass.
    pub pairs_found: usize,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Stored rows skipped as invariant violations.
    pub skipped: usize,
}

/// Intended persistence operations for one reconciliation pass. Pure
/// data; the caller applies it. Recomputing from the same inputs yields
/// the same operation set, so every operation is safely retryable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileOutcome {
    pub created: Vec<SimilarityPair>,
    pub updated: Vec<PairUpdate>,
    pub removed: Vec<Uuid>,
    pub stats: ReconcileStats,
}

/// Diff the computed pair set for `titles` against the stored pair set.
///
/// Every unordered title pair is scored; pairs at or above
/// `config.min_similarity_score` survive. A surviving pair with no stored
/// row becomes a create, one whose score or kind changed becomes an
/// update, and stored rows whose key was not produced this pass become
/// removals (their dismissal state goes with them).
///
/// Stored rows that violate invariants — foreign owner, self-pair — are
/// logged and skipped, never fatal.
pub fn reconcile(
    owner_id: Uuid,
    titles: &[Title],
    stored: &[SimilarityPair],
    config: &DedupConfig,
) -> ReconcileOutcome {
    let scorer = SimilarityScorer::new(config.clone());

    let mut stats = ReconcileStats {
        titles: titles.len(),
        ..Default::default()
    };

    let mut computed: HashMap<PairKey, (u8, MatchKind)> = HashMap::new();
    for i in 0..titles.len() {
        for j in (i + 1)..titles.len() {
            if titles[i].id == titles[j].id {
                warn!(title = %titles[i].id, "duplicate title id in input, skipping pair");
                stats.skipped += 1;
                continue;
            }
            stats.pairs_scored += 1;
            let result = scorer.score(&titles[i].name, &titles[j].name);
            if result.score >= config.min_similarity_score {
                computed.insert(
                    PairKey::new(titles[i].id, titles[j].id),
                    (result.score, result.kind),
                );
            }
        }
    }
    stats.pairs_found = computed.len();

    let mut stored_by_key: HashMap<PairKey, &SimilarityPair> = HashMap::new();
    for pair in stored {
        if pair.owner_id != owner_id {
            warn!(pair = %pair.id, owner = %pair.owner_id, "stored pair belongs to another owner, skipping");
            stats.skipped += 1;
            continue;
        }
        if pair.title_a_id == pair.title_b_id {
            warn!(pair = %pair.id, "stored pair references a single title, skipping");
            stats.skipped += 1;
            continue;
        }
        stored_by_key.insert(pair.key(), pair);
    }

    let mut created = Vec::new();
    let mut updated = Vec::new();
    for (key, (score, kind)) in &computed {
        match stored_by_key.get(key) {
            None => created.push(SimilarityPair::new(owner_id, *key, *score, *kind)),
            Some(existing) if existing.score != *score || existing.match_type != *kind => {
                updated.push(PairUpdate {
                    id: existing.id,
                    score: *score,
                    match_type: *kind,
                });
            }
            Some(_) => {}
        }
    }

    let mut removed: Vec<Uuid> = stored_by_key
        .iter()
        .filter(|(key, _)| !computed.contains_key(key))
        .map(|(_, pair)| pair.id)
        .collect();

    // Hash maps iterate in arbitrary order; sort so the outcome is
    // deterministic for equal inputs.
    created.sort_by_key(|p| (p.title_a_id, p.title_b_id));
    updated.sort_by_key(|u| u.id);
    removed.sort();

    stats.created = created.len();
    stats.updated = updated.len();
    stats.removed = removed.len();

    ReconcileOutcome {
        created,
        updated,
        removed,
        stats,
    }
}
