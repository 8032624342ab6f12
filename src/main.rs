use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use trendwatch::analysis::CompositeTrendAnalyzer;
use trendwatch::config::{AnalysisPolicy, AnalysisSettings, Config, SchedulerConfig};
use trendwatch::control::ControlSurface;
use trendwatch::domain::{AnalysisResult, CollectionResult, ScoredItem};
use trendwatch::scheduler::{
    Lifecycle, LoggingObserver, SERVICE_MANAGER_NAME, SchedulerDeps, SchedulerObserver, SchedulerOptions,
    TrendService, build_scheduler,
};
use trendwatch::scoring::{CategoryBaselines, SurgeInput, rank_by_surge, rank_stable};
use trendwatch::source::{FeedSource, ItemSource, MemorySink, PersistenceSink};

fn setup_logging(to_stderr: bool, default_level: &str) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(default_level);
    let mut builder = env_logger::Builder::from_env(env);

    if to_stderr {
        builder.target(env_logger::Target::Stderr).init();
        return Ok(());
    }

    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trendwatch")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("trendwatch.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run { feed, once } => handle_run_command(config, feed.as_deref(), *once).await,
        Commands::Check => handle_check_command(config),
        Commands::Score { file, surge, limit } => handle_score_command(config, file, *surge, *limit).await,
    }
}

fn deps_for(config: &Config, feed: Option<&Path>) -> SchedulerDeps {
    let feed_path = feed.map(Path::to_path_buf).unwrap_or_else(|| config.feed.path.clone());
    info!("Reading items from feed: {}", feed_path.display());

    let source: Arc<dyn ItemSource> = Arc::new(FeedSource::new(feed_path));
    let sink: Arc<dyn PersistenceSink> = Arc::new(MemorySink::new());
    SchedulerDeps::new(source, sink).with_options(SchedulerOptions::from(&config.runtime))
}

async fn handle_run_command(config: &Config, feed: Option<&Path>, once: bool) -> Result<()> {
    let deps = deps_for(config, feed);

    if once {
        return run_single_cycles(config, &deps).await;
    }

    let service = TrendService::new(config.schedulers.clone(), deps);
    let report = service.start().await.context("Failed to start schedulers")?;
    for id in &report.succeeded {
        println!("{} {}", "Started:".green(), id);
    }
    for (id, error) in &report.failed {
        println!("{} {} ({})", "Failed:".red(), id, error);
    }

    let control = ControlSurface::new(service.manager());
    let summary = control.all_statuses().await;
    println!(
        "{} {} running of {}; press Ctrl-C to stop",
        "Schedulers:".cyan(),
        summary.running_count,
        summary.total_count
    );

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;

    println!("{}", "Stopping schedulers...".yellow());
    let report = service.shutdown().await;
    for (id, error) in &report.failed {
        println!("{} {} ({})", "Failed to stop:".red(), id, error);
    }
    let summary = control.all_statuses().await;
    println!("{} {} stopped", "Done:".green(), summary.stopped_count);
    Ok(())
}

/// Prints each cycle's outcome to the terminal
struct ConsoleObserver {
    limit: usize,
}

#[async_trait]
impl SchedulerObserver for ConsoleObserver {
    fn name(&self) -> &str {
        "console"
    }

    async fn on_collection_completed(&self, scheduler_id: &str, result: &CollectionResult) -> trendwatch::Result<()> {
        println!(
            "{} {} collected {} items, filtered {}",
            "Collected:".cyan(),
            scheduler_id,
            result.total_collected,
            result.filtered_count
        );
        Ok(())
    }

    async fn on_analysis_completed(&self, scheduler_id: &str, result: &AnalysisResult) -> trendwatch::Result<()> {
        println!("{} {} trending items for {}", "Trending:".green(), result.trending_items.len(), scheduler_id);
        print_ranked(&result.trending_items, self.limit);
        Ok(())
    }

    async fn on_error(&self, scheduler_id: &str, error: &str, context: &str) -> trendwatch::Result<()> {
        println!("{} {} in {}: {}", "Error:".red(), scheduler_id, context, error);
        Ok(())
    }
}

async fn run_single_cycles(config: &Config, deps: &SchedulerDeps) -> Result<()> {
    let logging: Arc<dyn SchedulerObserver> = Arc::new(LoggingObserver::new(SERVICE_MANAGER_NAME));
    let console: Arc<dyn SchedulerObserver> = Arc::new(ConsoleObserver { limit: 10 });
    let mut failures = 0;

    for settings in &config.schedulers {
        let scheduler_config = SchedulerConfig::try_from(settings.clone())
            .with_context(|| format!("Invalid scheduler settings for '{}'", settings.id))?;
        if !scheduler_config.enabled() {
            continue;
        }

        let scheduler = build_scheduler(scheduler_config, deps);
        scheduler.add_observer(Arc::clone(&logging));
        scheduler.add_observer(Arc::clone(&console));

        if let Err(e) = scheduler.run_once().await {
            println!("{} {} ({})", "Cycle failed:".red(), scheduler.id(), e);
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} scheduler cycle(s) failed", failures);
    }
    Ok(())
}

fn handle_check_command(config: &Config) -> Result<()> {
    info!("Checking {} scheduler settings", config.schedulers.len());
    let mut invalid = 0;

    for settings in &config.schedulers {
        match SchedulerConfig::try_from(settings.clone()) {
            Ok(scheduler) => {
                let state = if scheduler.enabled() {
                    "enabled".green()
                } else {
                    "disabled".yellow()
                };
                println!(
                    "{} {} [{}] every {}m, {} items/cycle, min score {} ({})",
                    "OK".green(),
                    scheduler.id(),
                    scheduler.strategy().as_str(),
                    scheduler.interval().as_secs() / 60,
                    scheduler.collection().max_items(),
                    scheduler.analysis().min_score(),
                    state
                );
            }
            Err(e) => {
                println!("{} {}: {}", "INVALID".red(), settings.id, e);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        bail!("{} invalid scheduler configuration(s)", invalid);
    }
    println!("{} {} schedulers configured", "Config valid:".green(), config.schedulers.len());
    Ok(())
}

async fn handle_score_command(config: &Config, file: &Path, surge: bool, limit: usize) -> Result<()> {
    let items = FeedSource::new(file)
        .load()
        .await
        .with_context(|| format!("Failed to read feed {}", file.display()))?;
    let now = Utc::now();
    info!("Scoring {} items from {}", items.len(), file.display());

    let ranked = if surge {
        // no earlier snapshot: growth counts from zero since publication
        let candidates = items
            .into_iter()
            .map(|item| {
                let days = item.age_hours(now).map(|h| h / 24.0).unwrap_or(0.0);
                let input = SurgeInput::for_item(&item, 0, days, now);
                (item, input)
            })
            .collect();
        rank_by_surge(candidates)
    } else {
        let policy = match config.schedulers.first() {
            Some(settings) => AnalysisPolicy::try_from(settings.analysis.clone())
                .with_context(|| format!("Invalid analysis settings for '{}'", settings.id))?,
            None => AnalysisPolicy::try_from(AnalysisSettings::default())?,
        };
        let baselines = CategoryBaselines::fallback_only(policy.baseline_fallback());
        let analyzer = CompositeTrendAnalyzer::new(policy);
        let mut scored = analyzer.score_all(&items, &baselines, now);
        rank_stable(&mut scored);
        scored
    };

    let label = if surge { "surge" } else { "composite" };
    println!("{} {} items by {} score", "Ranked:".cyan(), ranked.len(), label);
    print_ranked(&ranked, limit);
    Ok(())
}

fn print_ranked(ranked: &[ScoredItem], limit: usize) {
    for (rank, scored) in ranked.iter().take(limit).enumerate() {
        let score = format!("{:>10.3}", scored.score);
        println!(
            "{:>3}. {} {} {} ({} views)",
            rank + 1,
            score.bold(),
            scored.item.id.yellow(),
            scored.item.title,
            scored.item.view_count
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the default level is known
    let level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    setup_logging(cli.log_stderr, &level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
