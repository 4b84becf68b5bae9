//! Conversion of raw (points, price) pairs into comparable deal figures.
//!
//! Both derived figures are rounded to one decimal with `f64::round`, which rounds
//! half away from zero. The half-way test is applied to the binary value of
//! `x * 10.0`, so identical inputs always produce bit-identical outputs.

use crate::error::{ScoreError, ScoreFailure, ScoreResult};
use crate::models::{RedeemableItem, RewardProgram, ScoredItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What `score_catalog` does when an item cannot be scored.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Abort on the first bad item.
    FailFast,
    /// Keep going and report bad items next to the scored ones.
    Isolate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogScore {
    pub scored: Vec<ScoredItem>,
    pub failures: Vec<ScoreFailure>,
}

/// Programs keyed by id, borrowed from the caller's catalog.
pub struct ProgramIndex<'a> {
    programs: HashMap<&'a str, &'a RewardProgram>,
}

impl<'a> ProgramIndex<'a> {
    pub fn new(programs: &'a [RewardProgram]) -> Self {
        let mut map = HashMap::with_capacity(programs.len());
        for program in programs {
            if map.contains_key(program.id.as_str()) {
                warn!(program_id = %program.id, "Duplicate program id, keeping the first");
                continue;
            }
            map.insert(program.id.as_str(), program);
        }
        Self { programs: map }
    }

    pub fn get(&self, id: &str) -> Option<&'a RewardProgram> {
        self.programs.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

pub fn score(item: &RedeemableItem, program: &RewardProgram) -> ScoreResult<ScoredItem> {
    if item.program_id != program.id {
        return Err(ScoreError::UnknownProgram {
            item_id: item.id.clone(),
            program_id: item.program_id.clone(),
        });
    }
    if !item.retail_price.is_finite() || item.retail_price <= 0.0 {
        return Err(invalid_price(item));
    }
    if item.points_required <= 0 {
        return Err(ScoreError::InvalidPointsCost {
            item_id: item.id.clone(),
            points: item.points_required,
        });
    }
    if !program.unit_cash_value.is_finite() || program.unit_cash_value <= 0.0 {
        return Err(invalid_rate(program));
    }

    let cash_value = item.points_required as f64 * program.unit_cash_value;
    let value_score = round_tenth(cash_value / item.retail_price * 100.0);
    let savings = round_tenth((item.retail_price - cash_value) / item.retail_price * 100.0);
    if !cash_value.is_finite() || !value_score.is_finite() {
        return Err(invalid_rate(program));
    }
    let savings_percentage = clamp_savings(savings);

    debug!(
        item_id = %item.id,
        cash_value,
        value_score,
        savings_percentage,
        "Item scored"
    );

    Ok(ScoredItem {
        item: item.clone(),
        value_score,
        savings_percentage,
    })
}

/// Scores `item` after resolving its program in `index`.
pub fn score_indexed(item: &RedeemableItem, index: &ProgramIndex<'_>) -> ScoreResult<ScoredItem> {
    match index.get(&item.program_id) {
        Some(program) => score(item, program),
        None => Err(ScoreError::UnknownProgram {
            item_id: item.id.clone(),
            program_id: item.program_id.clone(),
        }),
    }
}

/// Scores every item in input order.
///
/// With [`BatchPolicy::FailFast`] the first failure is returned as the error. With
/// [`BatchPolicy::Isolate`] failures are collected in [`CatalogScore::failures`] and the
/// remaining items are still scored.
pub fn score_catalog(
    items: &[RedeemableItem],
    programs: &[RewardProgram],
    policy: BatchPolicy,
) -> Result<CatalogScore, ScoreFailure> {
    let index = ProgramIndex::new(programs);
    let mut out = CatalogScore {
        scored: Vec::with_capacity(items.len()),
        failures: Vec::new(),
    };

    for item in items {
        match score_indexed(item, &index) {
            Ok(scored) => out.scored.push(scored),
            Err(error) => {
                let failure = ScoreFailure {
                    item_id: item.id.clone(),
                    error,
                };
                match policy {
                    BatchPolicy::FailFast => return Err(failure),
                    BatchPolicy::Isolate => {
                        warn!(item_id = %failure.item_id, error = %failure.error, "Skipping item");
                        out.failures.push(failure);
                    }
                }
            }
        }
    }

    info!(
        scored = out.scored.len(),
        failed = out.failures.len(),
        programs = index.len(),
        "Catalog scored"
    );
    Ok(out)
}

pub fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn clamp_savings(savings: f64) -> f64 {
    // Also folds -0.0 into 0.0.
    if savings <= 0.0 {
        0.0
    } else {
        savings.min(100.0)
    }
}

fn invalid_price(item: &RedeemableItem) -> ScoreError {
    ScoreError::InvalidPrice {
        item_id: item.id.clone(),
        price: item.retail_price,
    }
}

fn invalid_rate(program: &RewardProgram) -> ScoreError {
    ScoreError::InvalidConversionRate {
        program_id: program.id.clone(),
        rate: program.unit_cash_value,
    }
}
