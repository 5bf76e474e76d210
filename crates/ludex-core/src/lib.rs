pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, CoreConfig, DedupSettings};
pub use error::{LudexError, Result};
pub use models::*;

pub use storage::database::Database;
pub use storage::repositories::{
    PairRepository, Repository, SqlitePairRepository, SqliteTitleRepository, TitleRepository,
};
