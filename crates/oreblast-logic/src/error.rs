//! Error types for grid construction and blast cycles.

use thiserror::Error;

/// Reasons a sample table cannot be turned into a grid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridBuildError {
    /// Header row only, or no rows at all.
    #[error("no data rows: expected a header row followed by at least one sample")]
    NoDataRows,

    /// A required column is absent from the header.
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    /// Every data row was skipped during parsing.
    #[error("no valid samples after parsing")]
    NoValidSamples,

    /// Coordinates span more slots than a grid may hold.
    #[error("sample extent x {min_x}..={max_x}, y {min_y}..={max_y} is too large for a grid")]
    ExtentTooLarge {
        min_x: i64,
        max_x: i64,
        min_y: i64,
        max_y: i64,
    },
}

/// Unified error type for engine operations above the grid builder.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("grid build failed: {0}")]
    GridBuild(#[from] GridBuildError),

    /// Grid shape disagrees with its dimensions.
    #[error("grid shape does not match its dimensions")]
    InvalidGrid,

    #[error("blast limit of {0} reached")]
    BlastLimitReached(usize),

    #[error("invalid blast: {0}")]
    InvalidBlast(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config(message.into())
    }

    /// Creates an invalid blast error.
    pub fn invalid_blast(message: impl Into<String>) -> Self {
        EngineError::InvalidBlast(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
