//! Built-in sample catalog covering five chains. Written to disk the first time the
//! app runs so a fresh install has something to rank.

use crate::models::{RedeemableItem, RewardProgram};
use chrono::NaiveDate;

pub fn programs() -> Vec<RewardProgram> {
    vec![
        RewardProgram::new("mcdonalds", "McDonald's", "Points", 0.0012),
        RewardProgram::new("chipotle", "Chipotle", "Points", 0.0085),
        RewardProgram::new("starbucks", "Starbucks", "Stars", 0.0125),
        RewardProgram::new("subway", "Subway", "Tokens", 0.01),
        RewardProgram::new("tacobell", "Taco Bell", "Points", 0.005),
    ]
}

pub fn items() -> Vec<RedeemableItem> {
    let updated = date(2024, 1, 15);
    let row = |id: &str, program: &str, name: &str, category: &str, points: i64, price: f64| {
        RedeemableItem::new(id, program, name, category, points, price, updated)
    };
    vec![
        row("mcd-1", "mcdonalds", "Big Mac", "Burgers", 1500, 5.99),
        row("mcd-2", "mcdonalds", "Medium Fries", "Sides", 800, 2.89),
        row("mcd-3", "mcdonalds", "McFlurry", "Desserts", 1200, 4.49).with_promotion(date(2024, 2, 29)),
        row("mcd-4", "mcdonalds", "Cheeseburger", "Burgers", 1500, 2.39),
        row("chp-1", "chipotle", "Double Steak Bowl", "Bowls", 700, 4.95),
        row("chp-2", "chipotle", "Fountain Drink", "Beverages", 400, 2.70),
        row("chp-3", "chipotle", "Steak Burrito", "Burritos", 1650, 10.55),
        row("sbx-1", "starbucks", "Grande Latte", "Beverages", 150, 5.45),
        row("sbx-2", "starbucks", "Breakfast Sandwich", "Food", 200, 5.95),
        row("sbx-3", "starbucks", "Brewed Coffee", "Beverages", 100, 2.95).with_promotion(date(2024, 3, 31)),
        row("sub-1", "subway", "6-inch Sub", "Sandwiches", 400, 6.49),
        row("sub-2", "subway", "Cookie", "Desserts", 100, 0.99),
        row("tb-1", "tacobell", "Crunchwrap Supreme", "Specialties", 750, 5.49),
        row("tb-2", "tacobell", "Doritos Locos Taco", "Tacos", 250, 2.29),
    ]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    // Literal dates above are all valid.
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
