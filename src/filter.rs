use crate::models::ScoredItem;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Predicates applied to an already scored collection. Every set predicate is ANDed.
///
/// Empty `program_ids` or `categories` mean "no restriction"; a whitelist that is
/// `Some` but empty lets nothing through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub program_ids: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub points_range: Option<RangeInclusive<i64>>,
    pub min_value_score: Option<f64>,
    pub promotions_only: bool,
    pub id_whitelist: Option<BTreeSet<String>>,
    /// Case-insensitive substring of the name or category.
    pub search: Option<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn programs<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn points(mut self, range: RangeInclusive<i64>) -> Self {
        self.points_range = Some(range);
        self
    }

    pub fn min_value(mut self, score: f64) -> Self {
        self.min_value_score = Some(score);
        self
    }

    pub fn promotions_only(mut self, on: bool) -> Self {
        self.promotions_only = on;
        self
    }

    pub fn whitelist<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_whitelist = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn matches(&self, scored: &ScoredItem) -> bool {
        let item = &scored.item;
        if !self.program_ids.is_empty() && !self.program_ids.contains(&item.program_id) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&item.category) {
            return false;
        }
        if let Some(range) = &self.points_range {
            if !range.contains(&item.points_required) {
                return false;
            }
        }
        if let Some(min) = self.min_value_score {
            if scored.value_score < min {
                return false;
            }
        }
        if self.promotions_only && !item.is_promotion {
            return false;
        }
        if let Some(ids) = &self.id_whitelist {
            if !ids.contains(&item.id) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                item.name.to_lowercase().contains(&term)
                    || item.category.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

/// Keeps the items matching every predicate in `set`, in input order.
pub fn filter(items: &[ScoredItem], set: &FilterSet) -> Vec<ScoredItem> {
    items.iter().filter(|s| set.matches(s)).cloned().collect()
}
