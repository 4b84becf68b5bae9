use crate::models::{DATE_FMT, RedeemableItem, RewardProgram, ScoredItem};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use fs2::FileExt;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub fn read_programs(path: &Path) -> Result<Vec<RewardProgram>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    file.lock_shared()?;
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(&file);
    let mut programs = Vec::new();
    for result in reader.deserialize::<RewardProgram>() {
        let program = result.with_context(|| format!("Bad program row in {}", path.display()))?;
        programs.push(program);
    }
    file.unlock()?;
    debug!(path = %path.display(), count = programs.len(), "Programs loaded");
    Ok(programs)
}

pub fn read_items(path: &Path) -> Result<Vec<RedeemableItem>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    file.lock_shared()?;
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(&file);
    let mut items = Vec::new();
    for result in reader.deserialize::<CsvItem>() {
        let csv_item = result.with_context(|| format!("Bad item row in {}", path.display()))?;
        items.push(csv_item.into_record()?);
    }
    file.unlock()?;
    debug!(path = %path.display(), count = items.len(), "Items loaded");
    Ok(items)
}

pub fn write_programs(path: &Path, programs: &[RewardProgram]) -> Result<()> {
    let file = open_for_write(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(&file);
    for program in programs {
        writer.serialize(program)?;
    }
    writer.flush()?;
    file.unlock()?;
    Ok(())
}

pub fn write_items(path: &Path, items: &[RedeemableItem]) -> Result<()> {
    let file = open_for_write(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(&file);
    for item in items {
        writer.serialize(CsvItem::from(item))?;
    }
    writer.flush()?;
    file.unlock()?;
    Ok(())
}

/// Writes a ranked view, derived columns included.
pub fn write_scored(path: &Path, items: &[ScoredItem]) -> Result<()> {
    let file = open_for_write(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(&file);
    for scored in items {
        writer.serialize(CsvScored::from(scored))?;
    }
    writer.flush()?;
    file.unlock()?;
    Ok(())
}

/// A missing favorites file is an empty set.
pub fn read_favorites(path: &Path) -> Result<BTreeSet<String>> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let file = File::open(path)?;
    file.lock_shared()?;
    let ids: Vec<String> = serde_json::from_reader(BufReader::new(&file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    file.unlock()?;
    Ok(ids.into_iter().collect())
}

pub fn write_favorites(path: &Path, ids: &BTreeSet<String>) -> Result<()> {
    let file = open_for_write(path)?;
    let mut writer = BufWriter::new(&file);
    serde_json::to_writer_pretty(&mut writer, ids)?;
    writer.flush()?;
    drop(writer);
    file.unlock()?;
    Ok(())
}

fn open_for_write(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.lock_exclusive()?;
    file.set_len(0)?;
    Ok(file)
}

fn parse_date(field: &str, value: &str, item_id: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FMT)
        .with_context(|| format!("Item {item_id}: bad {field} date '{value}'"))
}

#[derive(serde::Deserialize, serde::Serialize)]
struct CsvItem {
    id: String,
    program_id: String,
    name: String,
    category: String,
    points_required: i64,
    retail_price: f64,
    is_promotion: bool,
    promotion_end: String,
    last_updated: String,
}

impl CsvItem {
    fn into_record(self) -> Result<RedeemableItem> {
        let promotion_end = if self.promotion_end.is_empty() {
            None
        } else {
            Some(parse_date("promotion_end", &self.promotion_end, &self.id)?)
        };
        let last_updated = parse_date("last_updated", &self.last_updated, &self.id)?;
        Ok(RedeemableItem {
            id: self.id,
            program_id: self.program_id,
            name: self.name,
            category: self.category,
            points_required: self.points_required,
            retail_price: self.retail_price,
            is_promotion: self.is_promotion,
            promotion_end,
            last_updated,
        })
    }
}

impl From<&RedeemableItem> for CsvItem {
    fn from(item: &RedeemableItem) -> Self {
        CsvItem {
            id: item.id.clone(),
            program_id: item.program_id.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            points_required: item.points_required,
            retail_price: item.retail_price,
            is_promotion: item.is_promotion,
            promotion_end: item
                .promotion_end
                .map(|d| d.format(DATE_FMT).to_string())
                .unwrap_or_default(),
            last_updated: item.last_updated.format(DATE_FMT).to_string(),
        }
    }
}

#[derive(serde::Serialize)]
struct CsvScored {
    id: String,
    program_id: String,
    name: String,
    category: String,
    points_required: i64,
    retail_price: f64,
    value_score: f64,
    savings_percentage: f64,
    is_promotion: bool,
    promotion_end: String,
    last_updated: String,
}

impl From<&ScoredItem> for CsvScored {
    fn from(scored: &ScoredItem) -> Self {
        let row = CsvItem::from(&scored.item);
        CsvScored {
            id: row.id,
            program_id: row.program_id,
            name: row.name,
            category: row.category,
            points_required: row.points_required,
            retail_price: row.retail_price,
            value_score: scored.value_score,
            savings_percentage: scored.savings_percentage,
            is_promotion: row.is_promotion,
            promotion_end: row.promotion_end,
            last_updated: row.last_updated,
        }
    }
}
