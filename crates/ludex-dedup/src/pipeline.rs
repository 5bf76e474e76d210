use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use ludex_core::{
    Database, PairRepository, Repository, SqlitePairRepository, SqliteTitleRepository,
    TitleRepository,
};

use crate::cluster::{DuplicateGroup, GroupingMode, build_groups};
use crate::config::DedupConfig;
use crate::error::Result;
use crate::reconcile::reconcile;

/// Summary of one reconciliation pass, serializable for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub owner_id: Uuid,
    pub titles: usize,
    pub pairs_scored: usize,
    pub pairs_found: usize,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub skipped: usize,
    pub persist_errors: Vec<String>,
}

/// Batch entry point: loads one owner's titles and stored pairs, runs the
/// reconciler, persists the difference, and serves the grouped read path.
///
/// Callers must not run two passes for the same owner concurrently; both
/// would diff against the same stale snapshot and race on the same keys.
/// Serializing passes per owner is the scheduler's job, not ours —
/// everything here operates on in-memory inputs and holds no lock across
/// the scoring loop.
pub struct DedupPipeline {
    config: DedupConfig,
}

impl DedupPipeline {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Run one reconciliation pass for an owner and persist the outcome.
    ///
    /// Operations are applied one at a time. Each is idempotent, so a
    /// failed write is recorded in the report and the rest still land;
    /// the next pass converges on the same state.
    pub fn run_for_owner(&self, db: &Database, owner_id: Uuid) -> Result<ReconcileReport> {
        let titles = SqliteTitleRepository::new(db.connection()).list_for_owner(&owner_id)?;
        let stored = SqlitePairRepository::new(db.connection()).list_for_owner(&owner_id)?;

        let outcome = reconcile(owner_id, &titles, &stored, &self.config);

        let mut persist_errors = Vec::new();
        let repo = SqlitePairRepository::new(db.connection());
        for pair in &outcome.created {
            if let Err(e) = repo.save(pair) {
                warn!(pair = %pair.id, error = %e, "failed to create similarity pair");
                persist_errors.push(format!("create {}: {e}", pair.id));
            }
        }
        for update in &outcome.updated {
            if let Err(e) = repo.update_match(&update.id, update.score, update.match_type) {
                warn!(pair = %update.id, error = %e, "failed to update similarity pair");
                persist_errors.push(format!("update {}: {e}", update.id));
            }
        }
        for id in &outcome.removed {
            if let Err(e) = repo.delete(id) {
                warn!(pair = %id, error = %e, "failed to remove similarity pair");
                persist_errors.push(format!("remove {id}: {e}"));
            }
        }
        drop(repo);

        let stats = outcome.stats;
        info!(
            owner = %owner_id,
            titles = stats.titles,
            found = stats.pairs_found,
            created = stats.created,
            updated = stats.updated,
            removed = stats.removed,
            "reconciliation pass finished"
        );

        Ok(ReconcileReport {
            owner_id,
            titles: stats.titles,
            pairs_scored: stats.pairs_scored,
            pairs_found: stats.pairs_found,
            created: stats.created,
            updated: stats.updated,
            removed: stats.removed,
            skipped: stats.skipped,
            persist_errors,
        })
    }

    /// Read path: duplicate groups for an owner as currently stored.
    /// Safe to call while another owner reconciles; a reader sees a pre-
    /// or post-pass snapshot, never a torn one.
    pub fn groups_for_owner(
        &self,
        db: &Database,
        owner_id: Uuid,
        mode: GroupingMode,
    ) -> Result<Vec<DuplicateGroup>> {
        let titles = SqliteTitleRepository::new(db.connection()).list_for_owner(&owner_id)?;
        let pairs = SqlitePairRepository::new(db.connection()).list_for_owner(&owner_id)?;
        Ok(build_groups(&titles, &pairs, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludex_core::Title;

    fn owner() -> Uuid {
        Uuid::from_u128(0xA)
    }

    fn seed(db: &Database, names: &[&str]) -> Vec<Title> {
        let repo = SqliteTitleRepository::new(db.connection());
        names
            .iter()
            .map(|name| {
                let title = Title::new(owner(), *name);
                repo.save(&title).unwrap();
                title
            })
            .collect()
    }

    #[test]
    fn full_pass_persists_pairs_and_groups() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["The Sims 4", "The Sims™ 4", "Doom", "Ultimate Doom"]);

        let pipeline = DedupPipeline::new(DedupConfig::default());
        let report = pipeline.run_for_owner(&db, owner()).unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.removed, 0);
        assert!(report.persist_errors.is_empty());

        let groups = pipeline
            .groups_for_owner(&db, owner(), GroupingMode::ActiveOnly)
            .unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn rerun_without_changes_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["The Sims 4", "The Sims™ 4"]);

        let pipeline = DedupPipeline::new(DedupConfig::default());
        pipeline.run_for_owner(&db, owner()).unwrap();
        let second = pipeline.run_for_owner(&db, owner()).unwrap();

        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.removed, 0);
    }

    #[test]
    fn dismissal_survives_rescans() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["The Sims 4", "The Sims™ 4"]);

        let pipeline = DedupPipeline::new(DedupConfig::default());
        pipeline.run_for_owner(&db, owner()).unwrap();

        let pair_id = {
            let repo = SqlitePairRepository::new(db.connection());
            let pairs = repo.list_for_owner(&owner()).unwrap();
            assert_eq!(pairs.len(), 1);
            repo.set_dismissed(&pairs[0].id, true).unwrap();
            pairs[0].id
        };

        pipeline.run_for_owner(&db, owner()).unwrap();

        let repo = SqlitePairRepository::new(db.connection());
        let pair = repo.find_by_id(&pair_id).unwrap().unwrap();
        assert!(pair.dismissed);
    }

    #[test]
    fn rename_triggers_removal_and_drops_dismissal_with_it() {
        let db = Database::open_in_memory().unwrap();
        let titles = seed(&db, &["The Sims 4", "The Sims™ 4"]);

        let pipeline = DedupPipeline::new(DedupConfig::default());
        pipeline.run_for_owner(&db, owner()).unwrap();

        {
            let repo = SqlitePairRepository::new(db.connection());
            let pairs = repo.list_for_owner(&owner()).unwrap();
            repo.set_dismissed(&pairs[0].id, true).unwrap();
        }

        // Rename one member so the pair stops qualifying.
        {
            let repo = SqliteTitleRepository::new(db.connection());
            let mut renamed = titles[1].clone();
            renamed.name = "Cities Skylines".to_string();
            repo.save(&renamed).unwrap();
        }

        let report = pipeline.run_for_owner(&db, owner()).unwrap();
        assert_eq!(report.removed, 1);

        let repo = SqlitePairRepository::new(db.connection());
        assert!(repo.list_for_owner(&owner()).unwrap().is_empty());
    }

    #[test]
    fn groups_read_both_modes() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["The Sims 4", "The Sims™ 4"]);

        let pipeline = DedupPipeline::new(DedupConfig::default());
        pipeline.run_for_owner(&db, owner()).unwrap();

        {
            let repo = SqlitePairRepository::new(db.connection());
            let pairs = repo.list_for_owner(&owner()).unwrap();
            repo.set_dismissed(&pairs[0].id, true).unwrap();
        }

        let active = pipeline
            .groups_for_owner(&db, owner(), GroupingMode::ActiveOnly)
            .unwrap();
        assert!(active.is_empty());

        let all = pipeline
            .groups_for_owner(&db, owner(), GroupingMode::IncludeDismissed)
            .unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].pairs[0].dismissed);
    }
}
