//! Data-quality inspection. Issues found here are warnings: items are never
//! rejected, corrected or re-flagged.

use crate::error::ScoreError;
use crate::models::{RedeemableItem, RewardProgram};
use crate::scoring::{ProgramIndex, score_indexed};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Bounds on retail price per loyalty unit outside which a pricing looks off.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct QualityThresholds {
    pub min_cash_per_point: f64,
    pub max_cash_per_point: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_cash_per_point: 0.001,
            max_cash_per_point: 0.1,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QualityIssue {
    SuspiciousValueRatio { item_id: String, cash_per_point: f64 },
    ExpiredPromotion { item_id: String, ended: NaiveDate },
    MissingPromotionEnd { item_id: String },
    DuplicateItemId { item_id: String },
    UnscorableItem { item_id: String, reason: String },
}

impl QualityIssue {
    pub fn item_id(&self) -> &str {
        match self {
            QualityIssue::SuspiciousValueRatio { item_id, .. }
            | QualityIssue::ExpiredPromotion { item_id, .. }
            | QualityIssue::MissingPromotionEnd { item_id }
            | QualityIssue::DuplicateItemId { item_id }
            | QualityIssue::UnscorableItem { item_id, .. } => item_id,
        }
    }

    pub fn message(&self) -> String {
        match self {
            QualityIssue::SuspiciousValueRatio { cash_per_point, .. } => {
                format!("price per point {cash_per_point:.4} seems unusual")
            }
            QualityIssue::ExpiredPromotion { ended, .. } => {
                format!("promotion ended {ended} but is still flagged")
            }
            QualityIssue::MissingPromotionEnd { .. } => "promotion has no end date".into(),
            QualityIssue::DuplicateItemId { .. } => "id appears more than once".into(),
            QualityIssue::UnscorableItem { reason, .. } => reason.clone(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QualityReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub issues: Vec<QualityIssue>,
    pub score: f64,
    pub recommendations: Vec<String>,
}

pub fn inspect(
    items: &[RedeemableItem],
    programs: &[RewardProgram],
    today: NaiveDate,
    thresholds: &QualityThresholds,
) -> QualityReport {
    let index = ProgramIndex::new(programs);
    let mut seen = HashSet::new();
    let mut issues = Vec::new();
    let mut valid = 0;

    for item in items {
        if !seen.insert(item.id.as_str()) {
            issues.push(QualityIssue::DuplicateItemId {
                item_id: item.id.clone(),
            });
        }

        match score_indexed(item, &index) {
            Ok(_) => {
                valid += 1;
                let cash_per_point = item.retail_price / item.points_required as f64;
                if cash_per_point < thresholds.min_cash_per_point
                    || cash_per_point > thresholds.max_cash_per_point
                {
                    issues.push(QualityIssue::SuspiciousValueRatio {
                        item_id: item.id.clone(),
                        cash_per_point,
                    });
                }
            }
            Err(err) => issues.push(unscorable(item, err)),
        }

        if item.is_promotion {
            match item.promotion_end {
                Some(ended) if ended < today => issues.push(QualityIssue::ExpiredPromotion {
                    item_id: item.id.clone(),
                    ended,
                }),
                Some(_) => {}
                None => issues.push(QualityIssue::MissingPromotionEnd {
                    item_id: item.id.clone(),
                }),
            }
        }
    }

    let total = items.len();
    let score = quality_score(valid, total, issues.len());
    info!(total, valid, issues = issues.len(), score, "Catalog inspected");

    let invalid = total - valid;
    let recommendations = recommendations(invalid, &issues, score);
    QualityReport {
        total,
        valid,
        invalid,
        issues,
        score,
        recommendations,
    }
}

/// One suggestion per kind of problem present, in a fixed order.
fn recommendations(invalid: usize, issues: &[QualityIssue], score: f64) -> Vec<String> {
    let has = |pred: fn(&QualityIssue) -> bool| issues.iter().any(pred);
    let mut out = Vec::new();
    if invalid > 0 {
        out.push("Review and fix unscorable items to improve data quality");
    }
    if has(|i| matches!(i, QualityIssue::SuspiciousValueRatio { .. })) {
        out.push("Investigate prices that look out of line with their points cost");
    }
    if has(|i| matches!(i, QualityIssue::ExpiredPromotion { .. })) {
        out.push("Update or deactivate expired promotions");
    }
    if has(|i| matches!(i, QualityIssue::MissingPromotionEnd { .. })) {
        out.push("Add end dates to open-ended promotions");
    }
    if has(|i| matches!(i, QualityIssue::DuplicateItemId { .. })) {
        out.push("Remove or rename items with duplicate ids");
    }
    if score < 90.0 {
        out.push("Consider implementing automated data quality checks");
    }
    out.into_iter().map(String::from).collect()
}

/// Share of scorable items, less two points per issue capped at twenty.
fn quality_score(valid: usize, total: usize, issues: usize) -> f64 {
    let base = if total == 0 {
        100.0
    } else {
        valid as f64 / total as f64 * 100.0
    };
    let deduction = (issues * 2).min(20) as f64;
    (base - deduction).max(0.0)
}

fn unscorable(item: &RedeemableItem, err: ScoreError) -> QualityIssue {
    QualityIssue::UnscorableItem {
        item_id: item.id.clone(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn programs() -> Vec<RewardProgram> {
        vec![RewardProgram::new("mcdonalds", "McDonald's", "Points", 0.0012)]
    }

    fn item(id: &str, points: i64, price: f64) -> RedeemableItem {
        RedeemableItem::new(id, "mcdonalds", "Thing", "Food", points, price, day(1, 15))
    }

    #[test]
    fn test_clean_catalog_scores_full() {
        let items = vec![item("a", 1500, 2.39), item("b", 800, 2.89)];
        let report = inspect(&items, &programs(), day(2, 1), &QualityThresholds::default());
        assert_eq!(report.valid, 2);
        assert_eq!(report.invalid, 0);
        assert!(report.issues.is_empty());
        assert_eq!(report.score, 100.0);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_empty_catalog() {
        let report = inspect(&[], &programs(), day(2, 1), &QualityThresholds::default());
        assert_eq!(report.total, 0);
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn test_expired_promotion_is_only_a_warning() {
        let items = vec![
            item("old", 1500, 2.39).with_promotion(day(1, 31)),
            item("live", 1500, 2.39).with_promotion(day(3, 1)),
        ];
        let report = inspect(&items, &programs(), day(2, 1), &QualityThresholds::default());
        assert_eq!(report.valid, 2);
        assert_eq!(
            report.issues,
            vec![QualityIssue::ExpiredPromotion {
                item_id: "old".into(),
                ended: day(1, 31),
            }]
        );
        assert!(items[0].is_promotion);
        assert_eq!(report.score, 98.0);
        assert_eq!(report.recommendations, ["Update or deactivate expired promotions"]);
    }

    #[test]
    fn test_missing_end_duplicate_and_ratio() {
        let mut no_end = item("promo", 1500, 2.39);
        no_end.is_promotion = true;
        let items = vec![
            no_end,
            item("dup", 1500, 2.39),
            item("dup", 1500, 2.39),
            // $5 for 10 points = 0.5 per point
            item("steep", 10, 5.0),
        ];
        let report = inspect(&items, &programs(), day(2, 1), &QualityThresholds::default());
        assert_eq!(report.issues.len(), 3);
        assert!(matches!(report.issues[0], QualityIssue::MissingPromotionEnd { .. }));
        assert!(matches!(report.issues[1], QualityIssue::DuplicateItemId { .. }));
        assert!(matches!(
            report.issues[2],
            QualityIssue::SuspiciousValueRatio { cash_per_point, .. } if cash_per_point == 0.5
        ));
        assert_eq!(report.issues[1].item_id(), "dup");
        // Three issues cost six points, leaving 94.
        assert_eq!(report.score, 94.0);
        assert_eq!(
            report.recommendations,
            [
                "Investigate prices that look out of line with their points cost",
                "Add end dates to open-ended promotions",
                "Remove or rename items with duplicate ids",
            ]
        );
    }

    #[test]
    fn test_unscorable_items_lower_the_score() {
        let mut orphan = item("orphan", 1500, 2.39);
        orphan.program_id = "nowhere".into();
        let items = vec![item("a", 1500, 2.39), orphan, item("free", 1500, 0.0)];
        let report = inspect(&items, &programs(), day(2, 1), &QualityThresholds::default());
        assert_eq!(report.valid, 1);
        assert_eq!(report.invalid, 2);
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues[0].message().contains("unknown program nowhere"));
        // 33.33 - 4
        assert!((report.score - (100.0 / 3.0 - 4.0)).abs() < 1e-9);
        assert_eq!(
            report.recommendations,
            [
                "Review and fix unscorable items to improve data quality",
                "Consider implementing automated data quality checks",
            ]
        );
    }

    #[test]
    fn test_deduction_is_capped() {
        assert_eq!(quality_score(10, 10, 50), 80.0);
        assert_eq!(quality_score(0, 10, 50), 0.0);
    }
}
