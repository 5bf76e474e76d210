//! Ludex dedup — title similarity scoring, pair reconciliation, duplicate groups.
//!
//! The engine is a discrete batch pass per owner: score every unordered
//! title pair with a tiered heuristic, diff the surviving pairs against
//! the stored set, and later group stored pairs into display clusters.

pub mod cluster;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod scorer;

pub use cluster::{DuplicateGroup, GroupingMode, PairSummary, build_groups};
pub use config::{DedupConfig, SequelPatterns};
pub use error::{DedupError, Result};
pub use pipeline::{DedupPipeline, ReconcileReport};
pub use reconcile::{PairUpdate, ReconcileOutcome, ReconcileStats, reconcile};
pub use scorer::{MatchScore, SimilarityScorer};
