use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use ludex_core::{MatchKind, SimilarityPair, Title};

/// Whether dismissed pairs link titles together when clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    /// Dismissed pairs do not union; a title related only through
    /// dismissed pairs stays out of every group.
    ActiveOnly,
    /// Dismissed pairs union like any other.
    IncludeDismissed,
}

/// Display summary of one stored pair. Always carries the dismissed flag
/// so callers can render state in either grouping mode.
#[derive(Debug, Clone, Serialize)]
pub struct PairSummary {
    pub id: Uuid,
    pub title_a_id: Uuid,
    pub title_b_id: Uuid,
    pub score: u8,
    pub match_type: MatchKind,
    pub dismissed: bool,
}

impl From<&SimilarityPair> for PairSummary {
    fn from(pair: &SimilarityPair) -> Self {
        Self {
            id: pair.id,
            title_a_id: pair.title_a_id,
            title_b_id: pair.title_b_id,
            score: pair.score,
            match_type: pair.match_type,
            dismissed: pair.dismissed,
        }
    }
}

/// A connected component of ≥ 2 titles plus every stored pair whose two
/// endpoints are both members. Multiple pairwise relations inside one
/// group all appear, not just a spanning subset.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub titles: Vec<Title>,
    pub pairs: Vec<PairSummary>,
}

/// Group transitively-related titles via union-find over the pair list.
///
/// Pairs referencing unknown titles or a single title are storage
/// inconsistencies: logged and skipped. Groups come back sorted by
/// descending size, ties by the smallest member id.
pub fn build_groups(
    titles: &[Title],
    pairs: &[SimilarityPair],
    mode: GroupingMode,
) -> Vec<DuplicateGroup> {
    let by_id: HashMap<Uuid, &Title> = titles.iter().map(|t| (t.id, t)).collect();

    let mut usable: Vec<&SimilarityPair> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        if pair.title_a_id == pair.title_b_id {
            warn!(pair = %pair.id, "similarity pair references a single title, skipping");
            continue;
        }
        if !by_id.contains_key(&pair.title_a_id) || !by_id.contains_key(&pair.title_b_id) {
            warn!(pair = %pair.id, "similarity pair references an unknown title, skipping");
            continue;
        }
        usable.push(pair);
    }

    // Stable title → index map, built fresh per call.
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut indexed: Vec<Uuid> = Vec::new();
    for pair in &usable {
        for id in [pair.title_a_id, pair.title_b_id] {
            index.entry(id).or_insert_with(|| {
                indexed.push(id);
                indexed.len() - 1
            });
        }
    }

    let mut dsu = DisjointSet::new(indexed.len());
    for pair in &usable {
        if mode == GroupingMode::ActiveOnly && pair.dismissed {
            continue;
        }
        dsu.union(index[&pair.title_a_id], index[&pair.title_b_id]);
    }

    let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
    for idx in 0..indexed.len() {
        components.entry(dsu.find(idx)).or_default().push(idx);
    }

    let mut groups = Vec::new();
    for member_indexes in components.into_values() {
        if member_indexes.len() < 2 {
            continue;
        }
        let member_ids: HashSet<Uuid> = member_indexes.iter().map(|i| indexed[*i]).collect();

        let mut group_titles: Vec<Title> =
            member_ids.iter().map(|id| by_id[id]).cloned().collect();
        group_titles.sort_by_key(|t| t.id);

        let mut group_pairs: Vec<PairSummary> = usable
            .iter()
            .filter(|p| member_ids.contains(&p.title_a_id) && member_ids.contains(&p.title_b_id))
            .map(|p| PairSummary::from(*p))
            .collect();
        group_pairs.sort_by_key(|p| (p.title_a_id, p.title_b_id));

        groups.push(DuplicateGroup {
            titles: group_titles,
            pairs: group_pairs,
        });
    }

    groups.sort_by(|x, y| {
        y.titles
            .len()
            .cmp(&x.titles.len())
            .then_with(|| x.titles[0].id.cmp(&y.titles[0].id))
    });
    groups
}

// ─── DisjointSet ───────────────────────────────────────────

/// Array-backed disjoint set with union by rank and path compression.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Second pass: point everything on the walk at the root.
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, left: usize, right: usize) {
        let left_root = self.find(left);
        let right_root = self.find(right);

        if left_root == right_root {
            return;
        }

        if self.rank[left_root] < self.rank[right_root] {
            self.parent[left_root] = right_root;
        } else if self.rank[left_root] > self.rank[right_root] {
            self.parent[right_root] = left_root;
        } else {
            self.parent[right_root] = left_root;
            self.rank[left_root] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludex_core::PairKey;

    fn owner() -> Uuid {
        Uuid::from_u128(0xA)
    }

    fn title(id: u128, name: &str) -> Title {
        let mut t = Title::new(owner(), name);
        t.id = Uuid::from_u128(id);
        t
    }

    fn pair(a: u128, b: u128, score: u8) -> SimilarityPair {
        SimilarityPair::new(
            owner(),
            PairKey::new(Uuid::from_u128(a), Uuid::from_u128(b)),
            score,
            MatchKind::Fuzzy,
        )
    }

    #[test]
    fn transitive_pairs_form_one_group() {
        let titles = vec![title(1, "A Game"), title(2, "B Game"), title(3, "C Game")];
        let pairs = vec![pair(1, 2, 80), pair(2, 3, 70)];

        let groups = build_groups(&titles, &pairs, GroupingMode::ActiveOnly);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].titles.len(), 3);
        assert_eq!(groups[0].pairs.len(), 2);
    }

    #[test]
    fn unrelated_components_stay_separate_and_sort_by_size() {
        let titles = vec![
            title(1, "A"),
            title(2, "B"),
            title(3, "C"),
            title(4, "D"),
            title(5, "E"),
        ];
        // {3,4,5} is larger than {1,2} so it comes first.
        let pairs = vec![pair(1, 2, 80), pair(3, 4, 70), pair(4, 5, 70)];

        let groups = build_groups(&titles, &pairs, GroupingMode::ActiveOnly);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].titles.len(), 3);
        assert_eq!(groups[1].titles.len(), 2);
        assert_eq!(groups[0].titles[0].id, Uuid::from_u128(3));
    }

    #[test]
    fn group_aggregates_every_internal_pair() {
        let titles = vec![title(1, "A"), title(2, "B"), title(3, "C")];
        // A triangle: three pairwise relations, one group, all three kept.
        let pairs = vec![pair(1, 2, 80), pair(2, 3, 70), pair(1, 3, 60)];

        let groups = build_groups(&titles, &pairs, GroupingMode::ActiveOnly);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pairs.len(), 3);
    }

    #[test]
    fn active_only_ignores_dismissed_links() {
        let titles = vec![title(1, "A"), title(2, "B"), title(3, "C")];
        let mut bridge = pair(2, 3, 70);
        bridge.dismissed = true;
        let pairs = vec![pair(1, 2, 80), bridge];

        let active = build_groups(&titles, &pairs, GroupingMode::ActiveOnly);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].titles.len(), 2);

        let all = build_groups(&titles, &pairs, GroupingMode::IncludeDismissed);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].titles.len(), 3);
        assert!(all[0].pairs.iter().any(|p| p.dismissed));
    }

    #[test]
    fn dismissed_internal_pair_still_appears_flagged() {
        let titles = vec![title(1, "A"), title(2, "B"), title(3, "C")];
        let mut diagonal = pair(1, 3, 60);
        diagonal.dismissed = true;
        let pairs = vec![pair(1, 2, 80), pair(2, 3, 70), diagonal];

        let groups = build_groups(&titles, &pairs, GroupingMode::ActiveOnly);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].titles.len(), 3);
        let flagged: Vec<_> = groups[0].pairs.iter().filter(|p| p.dismissed).collect();
        assert_eq!(flagged.len(), 1);
    }

    #[test]
    fn titles_without_pairs_never_group() {
        let titles = vec![title(1, "A"), title(2, "B"), title(3, "Loner")];
        let pairs = vec![pair(1, 2, 80)];

        let groups = build_groups(&titles, &pairs, GroupingMode::ActiveOnly);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].titles.iter().all(|t| t.id != Uuid::from_u128(3)));
    }

    #[test]
    fn corrupt_pairs_are_skipped() {
        let titles = vec![title(1, "A"), title(2, "B")];
        let dangling = pair(1, 99, 80);
        let self_pair = pair(5, 5, 80);
        let pairs = vec![pair(1, 2, 80), dangling, self_pair];

        let groups = build_groups(&titles, &pairs, GroupingMode::ActiveOnly);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pairs.len(), 1);
    }

    #[test]
    fn find_compresses_long_chains() {
        let mut dsu = DisjointSet::new(6);
        for i in 0..5 {
            dsu.union(i, i + 1);
        }
        let root = dsu.find(0);
        for i in 0..6 {
            assert_eq!(dsu.find(i), root);
        }
    }
}
