use crate::models::ScoredItem;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    ValueScore,
    PointsRequired,
    RetailPrice,
    SavingsPercentage,
    Name,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[value(alias = "asc")]
    Ascending,
    #[value(alias = "desc")]
    Descending,
}

/// The named orderings offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPreset {
    BestValue,
    LowestValue,
    FewestPoints,
    MostPoints,
    LowestPrice,
    HighestPrice,
    BestSavings,
    Name,
}

impl SortPreset {
    pub const ALL: [SortPreset; 8] = [
        SortPreset::BestValue,
        SortPreset::LowestValue,
        SortPreset::FewestPoints,
        SortPreset::MostPoints,
        SortPreset::LowestPrice,
        SortPreset::HighestPrice,
        SortPreset::BestSavings,
        SortPreset::Name,
    ];

    pub fn order(self) -> (SortKey, SortDirection) {
        use SortDirection::*;
        match self {
            SortPreset::BestValue => (SortKey::ValueScore, Descending),
            SortPreset::LowestValue => (SortKey::ValueScore, Ascending),
            SortPreset::FewestPoints => (SortKey::PointsRequired, Ascending),
            SortPreset::MostPoints => (SortKey::PointsRequired, Descending),
            SortPreset::LowestPrice => (SortKey::RetailPrice, Ascending),
            SortPreset::HighestPrice => (SortKey::RetailPrice, Descending),
            SortPreset::BestSavings => (SortKey::SavingsPercentage, Descending),
            SortPreset::Name => (SortKey::Name, Ascending),
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            SortPreset::BestValue => "best-value",
            SortPreset::LowestValue => "lowest-value",
            SortPreset::FewestPoints => "fewest-points",
            SortPreset::MostPoints => "most-points",
            SortPreset::LowestPrice => "lowest-price",
            SortPreset::HighestPrice => "highest-price",
            SortPreset::BestSavings => "best-savings",
            SortPreset::Name => "name",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortPreset::BestValue => "Best Value",
            SortPreset::LowestValue => "Lowest Value",
            SortPreset::FewestPoints => "Fewest Points",
            SortPreset::MostPoints => "Most Points",
            SortPreset::LowestPrice => "Lowest Price",
            SortPreset::HighestPrice => "Highest Price",
            SortPreset::BestSavings => "Best Savings",
            SortPreset::Name => "Name A-Z",
        }
    }
}

impl FromStr for SortPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SortPreset::ALL
            .into_iter()
            .find(|p| p.slug() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = SortPreset::ALL.iter().map(|p| p.slug()).collect();
                format!("unknown sort preset '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

impl fmt::Display for SortPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Total ascending order of two items on `key`.
pub fn compare(a: &ScoredItem, b: &ScoredItem, key: SortKey) -> Ordering {
    match key {
        SortKey::ValueScore => a.value_score.total_cmp(&b.value_score),
        SortKey::PointsRequired => a.item.points_required.cmp(&b.item.points_required),
        SortKey::RetailPrice => a.item.retail_price.total_cmp(&b.item.retail_price),
        SortKey::SavingsPercentage => a.savings_percentage.total_cmp(&b.savings_percentage),
        SortKey::Name => collate(&a.item.name, &b.item.name),
    }
}

/// Stable sort; items with equal keys keep their input order in both directions.
pub fn sort(mut items: Vec<ScoredItem>, key: SortKey, direction: SortDirection) -> Vec<ScoredItem> {
    match direction {
        SortDirection::Ascending => items.sort_by(|a, b| compare(a, b, key)),
        SortDirection::Descending => items.sort_by(|a, b| compare(b, a, key)),
    }
    items
}

/// Dictionary-style name ordering in three passes: base letters ignoring accents and
/// case, then accents, then case with lowercase first.
pub fn collate(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded(a).cmp(folded(b)))
        .then_with(|| b.cmp(a))
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    folded(s).filter(|c| !is_combining_mark(*c))
}

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

/// One page of an already sorted list. `limit` is capped at [`MAX_PAGE_SIZE`].
pub fn paginate(items: Vec<ScoredItem>, offset: usize, limit: usize) -> Vec<ScoredItem> {
    items
        .into_iter()
        .skip(offset)
        .take(limit.min(MAX_PAGE_SIZE))
        .collect()
}
