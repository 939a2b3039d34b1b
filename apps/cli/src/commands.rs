//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use aitracker_core::{HuggingFaceSummarizer, Orchestrator, SummaryBackend};
use aitracker_shared::{
    AppConfig, PersistedTool, Pricing, RunStatistics, SourceTag, expand_home, init_config,
    load_config, load_config_from,
};
use aitracker_storage::{Storage, ToolFilter, ToolOrder, ToolStore};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// aitracker: discover, enrich and catalog trending AI tools.
#[derive(Parser)]
#[command(
    name = "aitracker",
    version,
    about = "Discover trending AI tools and keep an enriched local catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.aitracker/aitracker.toml.
    #[arg(long, global = true, env = "AITRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database path (overrides `defaults.db_path`).
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape every enabled source, enrich the results and store them.
    Scan,

    /// Scrape and enrich a few records from the test sources without storing.
    TestScan {
        /// Records per source (overrides `sources.test_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Re-run enrichment for tools discovered on or after a date.
    Reanalyze {
        /// Start date (YYYY-MM-DD, UTC). Defaults to today.
        #[arg(long)]
        since: Option<NaiveDate>,
    },

    /// List catalogued tools.
    List {
        #[arg(long)]
        category: Option<String>,

        /// free, freemium, paid or unknown.
        #[arg(long)]
        pricing: Option<Pricing>,

        /// github, huggingface, huggingface-space or producthunt.
        #[arg(long)]
        source: Option<SourceTag>,

        /// hype, newest or name.
        #[arg(long, default_value = "hype")]
        order: ToolOrder,

        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Highest-hype tools discovered today (or over the last few days).
    Trending {
        /// Calendar days to include, counting today.
        #[arg(long, default_value = "1")]
        days: u32,

        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Show one catalogued tool in full.
    Show {
        /// Tool id as printed by `list --json`.
        id: String,
    },

    /// Catalog summary numbers.
    Stats,

    /// Tool counts per category.
    Categories,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "aitracker=info",
        1 => "aitracker=debug",
        _ => "aitracker=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so `--json` output on stdout stays parseable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&resolve_config(&cli)?),
        };
    }

    let config = resolve_config(&cli)?;
    let db_path = expand_home(cli.db.as_deref().unwrap_or(&config.defaults.db_path))?;
    let json = cli.json;

    match cli.command {
        Command::Scan => cmd_scan(&config, &db_path, json).await,
        Command::TestScan { limit } => cmd_test_scan(config, limit, json).await,
        Command::Reanalyze { since } => cmd_reanalyze(&config, &db_path, since, json).await,
        Command::List {
            category,
            pricing,
            source,
            order,
            limit,
        } => {
            let filter = ToolFilter {
                category,
                pricing,
                source,
                discovered_since: None,
            };
            cmd_list(&db_path, &filter, order, limit, json).await
        }
        Command::Trending { days, limit } => cmd_trending(&db_path, days, limit, json).await,
        Command::Show { id } => cmd_show(&db_path, &id, json).await,
        Command::Stats => cmd_stats(&db_path, json).await,
        Command::Categories => cmd_categories(&db_path, json).await,
        Command::Config { .. } => unreachable!("handled above"),
    }
}

/// `--config` wins over the default config location.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Open the catalog for writing, creating it and applying migrations as needed.
async fn open_store(db_path: &Path) -> Result<Arc<Storage>> {
    let storage = Storage::open(db_path)
        .await
        .map_err(|e| eyre!("cannot open database '{}': {e}", db_path.display()))?;
    Ok(Arc::new(storage))
}

/// Throwaway in-memory catalog for runs that never persist.
async fn scratch_store() -> Result<Arc<Storage>> {
    Ok(Arc::new(Storage::open_in_memory().await?))
}

/// Open an existing catalog for queries.
async fn open_reader(db_path: &Path) -> Result<Storage> {
    if !db_path.exists() {
        return Err(eyre!(
            "no database at '{}'. Run `aitracker scan` first.",
            db_path.display()
        ));
    }
    Storage::open_readonly(db_path)
        .await
        .map_err(|e| eyre!("cannot open database '{}': {e}", db_path.display()))
}

async fn build_orchestrator(config: &AppConfig, store: Arc<Storage>) -> Result<Orchestrator> {
    let backend = HuggingFaceSummarizer::from_config(&config.summarizer)?
        .map(|s| Arc::new(s) as Arc<dyn SummaryBackend>);
    if backend.is_none() {
        info!(
            env = %config.summarizer.api_key_env,
            "summarizer credential not set, using heuristic summaries"
        );
    }
    Ok(Orchestrator::from_config(config, store, backend)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Midnight UTC at the start of `date`.
fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Start of the trending window: `days` calendar days ending with `today`.
fn trending_since(today: NaiveDate, days: u32) -> DateTime<Utc> {
    let back = chrono::Duration::days(i64::from(days.saturating_sub(1)));
    start_of(today - back)
}

// ---------------------------------------------------------------------------
// Pipeline commands
// ---------------------------------------------------------------------------

async fn cmd_scan(config: &AppConfig, db_path: &Path, json: bool) -> Result<()> {
    let store = open_store(db_path).await?;
    let orchestrator = build_orchestrator(config, store).await?;

    info!(sources = ?config.sources.enabled, db = %db_path.display(), "starting scan");

    let spinner = Spinner::new("Scanning sources...");
    let result = orchestrator.run_scan().await;
    spinner.finish();

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            if json {
                print_json(&serde_json::json!({ "status": "error", "error": e.to_string() }))?;
            } else {
                println!("  Status: error");
            }
            return Err(e.into());
        }
    };

    if json {
        return print_json(&stats);
    }
    print_run_statistics(&stats);
    Ok(())
}

fn print_run_statistics(stats: &RunStatistics) {
    println!();
    println!("  Scan finished: {}", stats.status);
    for source in &stats.sources {
        match &source.failure {
            Some(reason) => println!("  {:<18} failed: {reason}", source.source),
            None => println!(
                "  {:<18} scraped {:>3}  inserted {:>3}  updated {:>3}  skipped {:>3}  failed {:>3}",
                source.source.as_str(),
                source.scraped,
                source.inserted,
                source.updated,
                source.skipped,
                source.failed
            ),
        }
    }
    println!();
    println!("  Scraped:  {}", stats.total_scraped);
    println!("  Enriched: {}", stats.total_enriched);
    println!("  Inserted: {}", stats.total_inserted);
    println!("  Updated:  {}", stats.total_updated);
    println!("  Skipped:  {}", stats.total_skipped);
    println!("  Failed:   {}", stats.total_failed);
    println!(
        "  Time:     {:.1}s",
        Duration::from_millis(stats.elapsed_ms).as_secs_f64()
    );
    println!();
}

async fn cmd_test_scan(mut config: AppConfig, limit: Option<usize>, json: bool) -> Result<()> {
    if let Some(limit) = limit {
        config.sources.test_limit = limit;
    }

    let store = scratch_store().await?;
    let orchestrator = build_orchestrator(&config, store).await?;

    let spinner = Spinner::new("Running test scan...");
    let result = orchestrator.run_test_scan().await;
    spinner.finish();
    let records = result?;

    if json {
        return print_json(&records);
    }

    println!();
    println!("  Test scan enriched {} record(s) (nothing stored)", records.len());
    for r in &records {
        println!();
        println!("  {} [{}]", r.record.name, r.record.source);
        println!("    URL:       {}", r.record.url);
        println!("    Category:  {}", r.category);
        println!("    Pricing:   {}", r.pricing);
        println!("    Hype:      {}", r.hype_score);
        println!("    Use cases: {}", r.use_cases.join(", "));
        println!("    Summary:   {}", r.summary);
    }
    println!();
    Ok(())
}

async fn cmd_reanalyze(
    config: &AppConfig,
    db_path: &Path,
    since: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let since = start_of(since.unwrap_or_else(|| Utc::now().date_naive()));

    let store = open_store(db_path).await?;
    let orchestrator = build_orchestrator(config, store).await?;

    let spinner = Spinner::new("Re-analyzing tools...");
    let result = orchestrator.reanalyze_since(since).await;
    spinner.finish();
    let report = result?;

    if json {
        return print_json(&report);
    }

    println!();
    println!("  Re-analysis since {}", since.date_naive());
    println!("  Examined: {}", report.examined);
    println!("  Updated:  {}", report.updated);
    println!("  Failed:   {}", report.failed);
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Query commands
// ---------------------------------------------------------------------------

async fn cmd_list(
    db_path: &Path,
    filter: &ToolFilter,
    order: ToolOrder,
    limit: u32,
    json: bool,
) -> Result<()> {
    let storage = open_reader(db_path).await?;
    let tools = storage.list(filter, order, limit).await?;

    if json {
        return print_json(&tools);
    }
    print_tools(&tools);
    Ok(())
}

async fn cmd_trending(db_path: &Path, days: u32, limit: u32, json: bool) -> Result<()> {
    let storage = open_reader(db_path).await?;
    let filter = ToolFilter {
        discovered_since: Some(trending_since(Utc::now().date_naive(), days)),
        ..Default::default()
    };
    let tools = storage.list(&filter, ToolOrder::Hype, limit).await?;

    if json {
        return print_json(&tools);
    }
    if days <= 1 {
        println!("  Trending today");
    } else {
        println!("  Trending over the last {days} days");
    }
    print_tools(&tools);
    Ok(())
}

async fn cmd_show(db_path: &Path, id: &str, json: bool) -> Result<()> {
    let storage = open_reader(db_path).await?;
    let tool = storage
        .get_tool(id)
        .await?
        .ok_or_else(|| eyre!("no tool with id '{id}'"))?;

    if json {
        return print_json(&tool);
    }

    let or_dash = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".into());

    println!();
    println!("  {} [{}]", tool.name, tool.source);
    println!("    ID:          {}", tool.id);
    println!("    URL:         {}", tool.url);
    println!("    Category:    {}", tool.category.as_deref().unwrap_or("-"));
    println!("    Pricing:     {}", tool.pricing.map(|p| p.as_str()).unwrap_or("-"));
    println!(
        "    Hype:        {}",
        tool.hype_score.map(|h| h.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("    Stars:       {} ({} today)", or_dash(tool.stars), or_dash(tool.today_stars));
    println!("    Likes:       {}", or_dash(tool.likes));
    println!("    Downloads:   {}", or_dash(tool.downloads));
    println!("    Upvotes:     {}", or_dash(tool.upvotes));
    println!("    Use cases:   {}", tool.use_cases.join(", "));
    println!("    Tags:        {}", tool.tags.join(", "));
    println!("    Discovered:  {}", tool.discovered_date.to_rfc3339());
    println!("    Updated:     {}", tool.updated_at.to_rfc3339());
    println!();
    println!("    {}", tool.summary.as_deref().unwrap_or(&tool.description));
    println!();
    Ok(())
}

fn print_tools(tools: &[PersistedTool]) {
    if tools.is_empty() {
        println!("  No tools found.");
        return;
    }

    println!();
    println!(
        "  {:>4}  {:<40}  {:<26}  {:<9}  {}",
        "HYPE", "NAME", "CATEGORY", "PRICING", "SOURCE"
    );
    for t in tools {
        println!(
            "  {:>4}  {:<40}  {:<26}  {:<9}  {}",
            t.hype_score.map(|h| h.to_string()).unwrap_or_else(|| "-".into()),
            t.name,
            t.category.as_deref().unwrap_or("-"),
            t.pricing.map(|p| p.as_str()).unwrap_or("-"),
            t.source
        );
    }
    println!();
}

async fn cmd_stats(db_path: &Path, json: bool) -> Result<()> {
    let storage = open_reader(db_path).await?;
    let stats = storage.stats(start_of(Utc::now().date_naive())).await?;

    if json {
        return print_json(&stats);
    }

    println!();
    println!("  Total tools:    {}", stats.total_tools);
    println!("  New today:      {}", stats.new_today);
    println!("  Avg hype score: {:.1}", stats.avg_hype_score);
    println!("  Top category:   {}", stats.top_category);
    println!();
    Ok(())
}

async fn cmd_categories(db_path: &Path, json: bool) -> Result<()> {
    let storage = open_reader(db_path).await?;
    let counts = storage.category_counts().await?;

    if json {
        return print_json(&counts);
    }

    println!();
    for c in &counts {
        println!("  {:>5}  {}", c.count, c.name);
    }
    if counts.is_empty() {
        println!("  No tools catalogued yet.");
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress spinner
// ---------------------------------------------------------------------------

/// Steady-ticking spinner shown while a pipeline command runs.
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}
