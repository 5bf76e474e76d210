use thiserror::Error;

/// All errors that can occur in ludex-core.
#[derive(Debug, Error)]
pub enum LudexError {
    #[error("Title not found: {0}")]
    TitleNotFound(String),

    #[error("Pair not found: {0}")]
    PairNotFound(String),

    #[error("No owner configured. Pass --owner or set default_owner in config.")]
    OwnerNotConfigured,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, LudexError>;
