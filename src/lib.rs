//! Ranks restaurant loyalty redemptions by how much cash value they return.
//!
//! The pipeline is `score_catalog` -> `filter` -> `sort`; every stage is a pure
//! function over caller-owned data.

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod quality;
pub mod ranking;
pub mod sample;
pub mod scoring;
pub mod stats;
pub mod storage;

pub use error::{ScoreError, ScoreFailure};
pub use filter::{FilterSet, filter};
pub use models::{RedeemableItem, RewardProgram, ScoredItem};
pub use ranking::{SortDirection, SortKey, SortPreset, sort};
pub use scoring::{BatchPolicy, CatalogScore, ProgramIndex, score, score_catalog};
