use crate::config::AppConfig;
use crate::filter::{FilterSet, filter};
use crate::models::{RedeemableItem, RewardProgram, ScoredItem};
use crate::quality::{QualityReport, inspect};
use crate::ranking::{DEFAULT_PAGE_SIZE, SortDirection, SortKey, SortPreset, paginate, sort};
use crate::scoring::{BatchPolicy, CatalogScore, score_catalog};
use crate::stats::CatalogStats;
use crate::storage::{read_favorites, read_items, read_programs, write_favorites, write_scored};
use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reward-ranker")]
#[command(about = "Rank restaurant loyalty redemptions by what they are worth")]
pub struct Cli {
    /// Items CSV to use instead of the configured one.
    #[arg(long = "items", global = true)]
    pub items_csv: Option<PathBuf>,
    /// Programs CSV to use instead of the configured one.
    #[arg(long = "programs", global = true)]
    pub programs_csv: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score, filter and sort the catalog.
    Rank(RankArgs),
    /// Summary figures for the scored catalog.
    Stats {
        #[arg(long, value_enum)]
        policy: Option<BatchPolicy>,
    },
    /// Report data-quality issues without changing anything.
    Validate {
        /// Also write the report as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Favorites(FavoritesCmd),
    Settings(SettingsCmd),
}

#[derive(Args, Debug)]
pub struct RankArgs {
    #[arg(long = "program")]
    pub programs: Vec<String>,
    #[arg(long = "category")]
    pub categories: Vec<String>,
    #[arg(long)]
    pub min_points: Option<i64>,
    #[arg(long)]
    pub max_points: Option<i64>,
    #[arg(long)]
    pub min_value: Option<f64>,
    #[arg(long)]
    pub promotions: bool,
    /// Only show favorited items.
    #[arg(long)]
    pub favorites: bool,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, value_enum, conflicts_with = "preset")]
    pub sort: Option<SortKey>,
    #[arg(long, value_enum, conflicts_with = "preset")]
    pub direction: Option<SortDirection>,
    /// Named ordering, e.g. best-value, fewest-points, name.
    #[arg(long)]
    pub preset: Option<SortPreset>,
    #[arg(long, value_enum)]
    pub policy: Option<BatchPolicy>,
    /// Page size, at most 100. Defaults to 50 when `--offset` is given.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Number of ranked rewards to skip.
    #[arg(long)]
    pub offset: Option<usize>,
    /// Write the ranked view to a CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct FavoritesCmd {
    #[command(subcommand)]
    pub cmd: FavoritesSub,
}

#[derive(Subcommand, Debug)]
pub enum FavoritesSub {
    Add { id: String },
    Remove { id: String },
    List,
}

#[derive(Parser, Debug)]
pub struct SettingsCmd {
    #[command(subcommand)]
    pub cmd: SettingsSub,
}

#[derive(Subcommand, Debug)]
pub enum SettingsSub {
    Show,
}

struct Catalog {
    items: Vec<RedeemableItem>,
    programs: Vec<RewardProgram>,
}

pub fn run(cli: Cli, cfg: &AppConfig) -> Result<()> {
    let catalog = || load_catalog(&cli, cfg);
    match &cli.command {
        Commands::Rank(args) => handle_rank(args, &catalog()?, cfg),
        Commands::Stats { policy } => handle_stats(*policy, &catalog()?, cfg),
        Commands::Validate { output } => handle_validate(output.as_deref(), &catalog()?, cfg),
        Commands::Favorites(fav) => handle_favorites(&fav.cmd, cfg),
        Commands::Settings(settings) => handle_settings(&settings.cmd, cfg),
    }
}

fn load_catalog(cli: &Cli, cfg: &AppConfig) -> Result<Catalog> {
    let paths = &cfg.settings.paths;
    let items_path = cli.items_csv.as_ref().unwrap_or(&paths.items_csv);
    let programs_path = cli.programs_csv.as_ref().unwrap_or(&paths.programs_csv);
    Ok(Catalog {
        items: read_items(items_path)?,
        programs: read_programs(programs_path)?,
    })
}

fn score_with(catalog: &Catalog, policy: Option<BatchPolicy>, cfg: &AppConfig) -> Result<CatalogScore> {
    let policy = policy.unwrap_or(cfg.settings.scoring.batch_policy);
    let out = score_catalog(&catalog.items, &catalog.programs, policy)?;
    Ok(out)
}

fn handle_rank(args: &RankArgs, catalog: &Catalog, cfg: &AppConfig) -> Result<()> {
    let scored = score_with(catalog, args.policy, cfg)?;
    let favorites = if args.favorites {
        Some(read_favorites(&cfg.settings.paths.favorites_json)?)
    } else {
        None
    };
    let set = filter_set(args, favorites);
    let (key, direction) = sort_order(args);

    let mut ranked = sort(filter(&scored.scored, &set), key, direction);
    info!(matched = ranked.len(), ?key, ?direction, "Catalog ranked");
    if args.offset.is_some() || args.limit.is_some() {
        ranked = paginate(
            ranked,
            args.offset.unwrap_or(0),
            args.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        );
    }

    if ranked.is_empty() {
        println!("No rewards match.");
    }
    let programs: HashMap<_, _> = catalog.programs.iter().map(|p| (p.id.as_str(), p)).collect();
    for s in &ranked {
        print_scored(s, programs.get(s.item.program_id.as_str()).copied(), cfg);
    }
    print_failures(&scored);

    if let Some(path) = &args.export {
        write_scored(path, &ranked)?;
        println!("Exported {} rewards to {}.", ranked.len(), path.display());
    }
    Ok(())
}

pub fn filter_set(args: &RankArgs, favorites: Option<BTreeSet<String>>) -> FilterSet {
    let mut set = FilterSet::new()
        .programs(args.programs.iter().cloned())
        .categories(args.categories.iter().cloned())
        .promotions_only(args.promotions);
    if args.min_points.is_some() || args.max_points.is_some() {
        set = set.points(args.min_points.unwrap_or(i64::MIN)..=args.max_points.unwrap_or(i64::MAX));
    }
    if let Some(min) = args.min_value {
        set = set.min_value(min);
    }
    if let Some(term) = &args.search {
        set = set.search(term.clone());
    }
    set.id_whitelist = favorites;
    set
}

pub fn sort_order(args: &RankArgs) -> (SortKey, SortDirection) {
    if let Some(preset) = args.preset {
        return preset.order();
    }
    let key = args.sort.unwrap_or(SortKey::ValueScore);
    let direction = args.direction.unwrap_or(match key {
        SortKey::Name => SortDirection::Ascending,
        _ => SortDirection::Descending,
    });
    (key, direction)
}

fn print_scored(s: &ScoredItem, program: Option<&RewardProgram>, cfg: &AppConfig) {
    let ui = &cfg.settings.ui;
    let (chain, currency) = program
        .map(|p| (p.name.as_str(), p.currency_name.as_str()))
        .unwrap_or((s.item.program_id.as_str(), "points"));
    let mut value_str = format!("{:.1}", s.value_score);
    if s.value_score >= ui.good_value_threshold {
        value_str = value_str.green().to_string();
    } else if s.value_score < ui.poor_value_threshold {
        value_str = value_str.red().to_string();
    }
    let promo = match (s.item.is_promotion, s.item.promotion_end) {
        (true, Some(end)) => format!(" | promo until {end}").yellow().to_string(),
        (true, None) => " | promo".yellow().to_string(),
        _ => String::new(),
    };
    println!(
        "{} | {} | {} | {} {} | {}{:.2} | value:{} | savings:{:.1}%{}",
        s.item.name.bold(),
        chain,
        s.item.category,
        s.item.points_required,
        currency,
        ui.currency_symbol,
        s.item.retail_price,
        value_str,
        s.savings_percentage,
        promo
    );
}

fn print_failures(scored: &CatalogScore) {
    if scored.failures.is_empty() {
        return;
    }
    println!(
        "{}",
        format!("Skipped {} unscorable items:", scored.failures.len()).yellow()
    );
    for failure in &scored.failures {
        println!("  {}", failure.error);
    }
}

fn handle_stats(policy: Option<BatchPolicy>, catalog: &Catalog, cfg: &AppConfig) -> Result<()> {
    let scored = score_with(catalog, policy, cfg)?;
    let stats = CatalogStats::compute(&scored.scored);

    println!("Total rewards: {}", stats.total);
    println!("Avg value score: {:.1}", stats.avg_value_score);
    println!("Avg savings: {:.1}%", stats.avg_savings);
    println!("Active promotions: {}", stats.promotion_count);
    println!();
    for p in &stats.by_program {
        let name = catalog
            .programs
            .iter()
            .find(|prog| prog.id == p.program_id)
            .map(|prog| prog.name.as_str())
            .unwrap_or(p.program_id.as_str());
        let best = p
            .best_deal
            .as_deref()
            .and_then(|id| scored.scored.iter().find(|s| s.item.id == id))
            .map(|s| s.item.name.as_str())
            .unwrap_or("-");
        println!(
            "{} | {} rewards | value:{:.1} | savings:{:.1}% | best: {}",
            name.bold(),
            p.count,
            p.avg_value_score,
            p.avg_savings,
            best
        );
    }
    println!();
    for c in &stats.by_category {
        println!("{} | {} rewards | value:{:.1}", c.category, c.count, c.avg_value_score);
    }
    print_failures(&scored);
    Ok(())
}

fn handle_validate(output: Option<&Path>, catalog: &Catalog, cfg: &AppConfig) -> Result<()> {
    let today = Local::now().date_naive();
    let report = inspect(&catalog.items, &catalog.programs, today, &cfg.settings.quality);
    print_report(&report);
    if let Some(path) = output {
        let data = serde_json::to_string_pretty(&report)?;
        fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Report written to {}.", path.display());
    }
    Ok(())
}

fn print_report(report: &QualityReport) {
    let mut score = format!("{:.1}%", report.score);
    if report.score >= 90.0 {
        score = score.green().to_string();
    } else {
        score = score.red().to_string();
    }
    println!("Data quality score: {score}");
    println!("Items: {}/{} scorable", report.valid, report.total);
    if report.issues.is_empty() {
        println!("No issues found.");
        return;
    }
    println!("Issues ({}):", report.issues.len());
    for issue in &report.issues {
        println!("  {} {}", issue.item_id().yellow(), issue.message());
    }
    println!("Recommendations:");
    for rec in &report.recommendations {
        println!("  - {rec}");
    }
}

fn handle_favorites(cmd: &FavoritesSub, cfg: &AppConfig) -> Result<()> {
    let path = &cfg.settings.paths.favorites_json;
    let mut favorites = read_favorites(path)?;
    match cmd {
        FavoritesSub::Add { id } => {
            if favorites.insert(id.clone()) {
                write_favorites(path, &favorites)?;
                println!("Favorite added.");
            } else {
                println!("Already a favorite.");
            }
        }
        FavoritesSub::Remove { id } => {
            if !favorites.remove(id) {
                return Err(anyhow!("{id} is not a favorite"));
            }
            write_favorites(path, &favorites)?;
            println!("Favorite removed.");
        }
        FavoritesSub::List => {
            if favorites.is_empty() {
                println!("No favorites yet.");
            }
            for id in &favorites {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn handle_settings(cmd: &SettingsSub, cfg: &AppConfig) -> Result<()> {
    match cmd {
        SettingsSub::Show => {
            let s = &cfg.settings;
            println!("Config directory: {}", cfg.base_dir.display());
            println!("Programs CSV: {}", s.paths.programs_csv.display());
            println!("Items CSV: {}", s.paths.items_csv.display());
            println!("Favorites: {}", s.paths.favorites_json.display());
            println!("Batch policy: {:?}", s.scoring.batch_policy);
            println!(
                "Price per point bounds: {} .. {}",
                s.quality.min_cash_per_point, s.quality.max_cash_per_point
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::write_programs;
    use tempfile::tempdir;

    fn rank_args(argv: &[&str]) -> RankArgs {
        let mut full = vec!["reward-ranker", "rank"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Rank(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_default_order_is_best_value() {
        assert_eq!(
            sort_order(&rank_args(&[])),
            (SortKey::ValueScore, SortDirection::Descending)
        );
    }

    #[test]
    fn test_name_defaults_to_ascending() {
        assert_eq!(
            sort_order(&rank_args(&["--sort", "name"])),
            (SortKey::Name, SortDirection::Ascending)
        );
        assert_eq!(
            sort_order(&rank_args(&["--sort", "retail-price", "--direction", "asc"])),
            (SortKey::RetailPrice, SortDirection::Ascending)
        );
    }

    #[test]
    fn test_preset_conflicts_with_sort() {
        assert_eq!(
            sort_order(&rank_args(&["--preset", "fewest-points"])),
            (SortKey::PointsRequired, SortDirection::Ascending)
        );
        let err = Cli::try_parse_from(["reward-ranker", "rank", "--preset", "name", "--sort", "name"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_filter_set_from_flags() {
        let args = rank_args(&[
            "--program", "starbucks", "--program", "subway", "--max-points", "400",
            "--min-value", "50", "--promotions",
        ]);
        let set = filter_set(&args, None);
        assert_eq!(set.program_ids.len(), 2);
        assert!(set.categories.is_empty());
        assert_eq!(set.points_range, Some(i64::MIN..=400));
        assert_eq!(set.min_value_score, Some(50.0));
        assert!(set.promotions_only);
        assert!(set.id_whitelist.is_none());
    }

    #[test]
    fn test_global_paths_after_subcommand() {
        let cli = Cli::try_parse_from(["reward-ranker", "stats", "--items", "x.csv"]).unwrap();
        assert_eq!(cli.items_csv, Some(PathBuf::from("x.csv")));
    }

    #[test]
    fn test_program_filter_and_programs_path_coexist() {
        let cli = Cli::try_parse_from([
            "reward-ranker", "rank", "--program", "a", "--programs", "p.csv", "--program", "b",
        ])
        .unwrap();
        assert_eq!(cli.programs_csv, Some(PathBuf::from("p.csv")));
        match cli.command {
            Commands::Rank(args) => assert_eq!(args.programs, ["a", "b"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_offset_and_limit_flags() {
        let args = rank_args(&["--offset", "10", "--limit", "5"]);
        assert_eq!(args.offset, Some(10));
        assert_eq!(args.limit, Some(5));
    }

    fn cli(argv: &[&str]) -> Cli {
        let mut full = vec!["reward-ranker"];
        full.extend_from_slice(argv);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_rank_favorites_with_custom_programs() {
        let dir = tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path()).unwrap();

        // Only Starbucks, at a richer rate than the sample.
        let programs = dir.path().join("custom_programs.csv");
        write_programs(&programs, &[RewardProgram::new("starbucks", "Starbucks", "Stars", 0.02)])
            .unwrap();
        let favorites: BTreeSet<String> =
            ["sbx-1", "sbx-3", "mcd-1"].into_iter().map(String::from).collect();
        write_favorites(&cfg.settings.paths.favorites_json, &favorites).unwrap();

        let out = dir.path().join("ranked.csv");
        run(
            cli(&[
                "rank",
                "--program", "starbucks",
                "--favorites",
                "--programs", programs.to_str().unwrap(),
                "--export", out.to_str().unwrap(),
            ]),
            &cfg,
        )
        .unwrap();

        let text = fs::read_to_string(&out).unwrap();
        let rows: Vec<_> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        // 100 * 0.02 / 2.95 and 150 * 0.02 / 5.45
        assert!(rows[0].starts_with("sbx-3,") && rows[0].contains(",67.8,"), "{}", rows[0]);
        assert!(rows[1].starts_with("sbx-1,") && rows[1].contains(",55.0,"), "{}", rows[1]);
    }

    #[test]
    fn test_rank_fail_fast_reports_unknown_program() {
        let dir = tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path()).unwrap();
        let programs = dir.path().join("custom_programs.csv");
        write_programs(&programs, &[RewardProgram::new("starbucks", "Starbucks", "Stars", 0.02)])
            .unwrap();

        let err = run(
            cli(&["rank", "--policy", "fail-fast", "--programs", programs.to_str().unwrap()]),
            &cfg,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("unknown program mcdonalds"));
    }

    #[test]
    fn test_rank_pages_through_export() {
        let dir = tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path()).unwrap();
        let mut exported = Vec::new();
        for offset in ["0", "5", "10", "15"] {
            let out = dir.path().join(format!("page_{offset}.csv"));
            run(
                cli(&["rank", "--offset", offset, "--limit", "5", "--export", out.to_str().unwrap()]),
                &cfg,
            )
            .unwrap();
            let text = fs::read_to_string(&out).unwrap();
            exported.extend(text.lines().skip(1).map(|l| l.split(',').next().unwrap().to_string()));
        }
        assert_eq!(exported.len(), 14);
        let unique: BTreeSet<_> = exported.iter().collect();
        assert_eq!(unique.len(), 14);
        assert_eq!(&exported[..3], ["chp-3", "chp-2", "chp-1"]);
    }
}
