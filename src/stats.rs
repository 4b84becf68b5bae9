use crate::models::ScoredItem;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CatalogStats {
    pub total: usize,
    pub avg_value_score: f64,
    pub avg_savings: f64,
    pub promotion_count: usize,
    pub by_program: Vec<ProgramStats>,
    pub by_category: Vec<CategoryStats>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProgramStats {
    pub program_id: String,
    pub count: usize,
    pub avg_value_score: f64,
    pub avg_savings: f64,
    /// Id of the highest value score; the earliest item wins a tie.
    pub best_deal: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    pub avg_value_score: f64,
}

#[derive(Default)]
struct ProgramAcc {
    count: usize,
    value_sum: f64,
    savings_sum: f64,
    best: Option<(f64, String)>,
}

#[derive(Default)]
struct CategoryAcc {
    count: usize,
    value_sum: f64,
}

impl CatalogStats {
    /// Breakdowns are listed in order of first appearance.
    pub fn compute(items: &[ScoredItem]) -> Self {
        let mut programs: HashMap<&str, ProgramAcc> = HashMap::new();
        let mut program_order: Vec<&str> = Vec::new();
        let mut categories: HashMap<&str, CategoryAcc> = HashMap::new();
        let mut category_order: Vec<&str> = Vec::new();

        for s in items {
            let pid = s.item.program_id.as_str();
            let acc = programs.entry(pid).or_insert_with(|| {
                program_order.push(pid);
                ProgramAcc::default()
            });
            acc.count += 1;
            acc.value_sum += s.value_score;
            acc.savings_sum += s.savings_percentage;
            // Strict comparison keeps the earliest item on a tie.
            if acc.best.as_ref().is_none_or(|(best, _)| s.value_score > *best) {
                acc.best = Some((s.value_score, s.item.id.clone()));
            }

            let category = s.item.category.as_str();
            let acc = categories.entry(category).or_insert_with(|| {
                category_order.push(category);
                CategoryAcc::default()
            });
            acc.count += 1;
            acc.value_sum += s.value_score;
        }

        let by_program = program_order
            .into_iter()
            .filter_map(|pid| {
                let acc = programs.remove(pid)?;
                Some(ProgramStats {
                    program_id: pid.to_string(),
                    count: acc.count,
                    avg_value_score: mean(acc.value_sum, acc.count),
                    avg_savings: mean(acc.savings_sum, acc.count),
                    best_deal: acc.best.map(|(_, id)| id),
                })
            })
            .collect();
        let by_category = category_order
            .into_iter()
            .filter_map(|category| {
                let acc = categories.remove(category)?;
                Some(CategoryStats {
                    category: category.to_string(),
                    count: acc.count,
                    avg_value_score: mean(acc.value_sum, acc.count),
                })
            })
            .collect();

        CatalogStats {
            total: items.len(),
            avg_value_score: mean(items.iter().map(|s| s.value_score).sum(), items.len()),
            avg_savings: mean(items.iter().map(|s| s.savings_percentage).sum(), items.len()),
            promotion_count: items.iter().filter(|s| s.item.is_promotion).count(),
            by_program,
            by_category,
        }
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64 * 100.0).round() / 100.0
}
