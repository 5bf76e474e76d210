use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("storage error: {0}")]
    Storage(#[from] ludex_core::LudexError),
}

pub type Result<T> = std::result::Result<T, DedupError>;
