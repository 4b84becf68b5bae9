use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FMT: &str = "%Y-%m-%d";

/// One restaurant chain's loyalty program.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RewardProgram {
    pub id: String,
    pub name: String,
    pub currency_name: String,
    /// Cash worth of a single loyalty unit.
    pub unit_cash_value: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RedeemableItem {
    pub id: String,
    pub program_id: String,
    pub name: String,
    pub category: String,
    pub points_required: i64,
    pub retail_price: f64,
    pub is_promotion: bool,
    pub promotion_end: Option<NaiveDate>,
    pub last_updated: NaiveDate,
}

/// An item together with the figures derived from its program's conversion rate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: RedeemableItem,
    pub value_score: f64,
    pub savings_percentage: f64,
}

impl RewardProgram {
    pub fn new(id: &str, name: &str, currency_name: &str, unit_cash_value: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            currency_name: currency_name.into(),
            unit_cash_value,
        }
    }
}

impl RedeemableItem {
    pub fn new(
        id: &str,
        program_id: &str,
        name: &str,
        category: &str,
        points_required: i64,
        retail_price: f64,
        last_updated: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            program_id: program_id.into(),
            name: name.into(),
            category: category.into(),
            points_required,
            retail_price,
            is_promotion: false,
            promotion_end: None,
            last_updated,
        }
    }

    pub fn with_promotion(mut self, ends: NaiveDate) -> Self {
        self.is_promotion = true;
        self.promotion_end = Some(ends);
        self
    }
}

impl ScoredItem {
    pub fn id(&self) -> &str {
        &self.item.id
    }
}
