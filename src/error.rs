use thiserror::Error;

/// Reasons a single item cannot be given a score. All of them point at bad input data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("item {item_id}: retail price must be positive, got {price}")]
    InvalidPrice { item_id: String, price: f64 },

    #[error("item {item_id}: points required must be positive, got {points}")]
    InvalidPointsCost { item_id: String, points: i64 },

    #[error("program {program_id}: unit cash value must be positive, got {rate}")]
    InvalidConversionRate { program_id: String, rate: f64 },

    #[error("item {item_id}: unknown program {program_id}")]
    UnknownProgram { item_id: String, program_id: String },
}

/// A scoring error tied to the item that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to score {item_id}: {error}")]
pub struct ScoreFailure {
    pub item_id: String,
    #[source]
    pub error: ScoreError,
}

pub type ScoreResult<T> = std::result::Result<T, ScoreError>;
