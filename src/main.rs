//! toolsage - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use toolsage::{
    cli::{read_experience_log, replay_into, Args, Commands, Verbosity},
    config::Config,
    experience::{Experience, ExperienceStore, InMemorySemanticStore},
    patterns::ErrorPatternAnalyzer,
    selector::{DecisionStrategy, ToolRecommendation, ToolSelector},
    telemetry::{TelemetryCollector, TelemetryDisplay},
    tools::{ToolCatalog, ToolRegistry, ToolSchema},
};
use tracing_subscriber::EnvFilter;

/// Everything a subcommand needs, built from one experience log
struct Engine {
    store: Arc<ExperienceStore>,
    catalog: Arc<ToolRegistry>,
    telemetry: TelemetryCollector,
    experiences: Vec<Experience>,
}

impl Engine {
    async fn load(log: &Path, config: &Config) -> Result<Self> {
        let telemetry = TelemetryCollector::new();
        let store = Arc::new(
            ExperienceStore::with_config(
                Arc::new(InMemorySemanticStore::new()),
                config.store.clone(),
            )
            .with_telemetry(telemetry.clone()),
        );

        let experiences = read_experience_log(log)?;
        replay_into(&store, &experiences).await?;

        // Builtins plus every tool the log has seen
        let catalog = Arc::new(ToolRegistry::with_builtin_tools());
        for exp in &experiences {
            if let Some(tool) = &exp.tool_called {
                if !catalog.contains(tool) {
                    catalog.register(ToolSchema::named(tool.clone()));
                }
            }
        }

        Ok(Self {
            store,
            catalog,
            telemetry,
            experiences,
        })
    }

    fn analyzer(&self, config: &Config) -> ErrorPatternAnalyzer {
        ErrorPatternAnalyzer::with_config(config.analyzer.clone())
            .with_store(self.store.clone())
            .with_telemetry(self.telemetry.clone())
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();
    init_tracing(verbosity);

    let config = load_config(&args)?;

    let telemetry = match &args.command {
        Commands::Recommend {
            log,
            query,
            intent,
            seed,
        } => run_recommend(&config, log, query, intent, *seed).await?,
        Commands::Stats { log, tool, intent } => run_stats(&config, log, tool, intent).await?,
        Commands::Patterns { log, all } => run_patterns(&config, log, *all).await?,
        Commands::Diagnose { log, query, error } => {
            run_diagnose(&config, log, query, error).await?
        }
        Commands::Config => {
            show_config(&args, &config)?;
            None
        }
    };

    if verbosity.show_summary() {
        if let Some(telemetry) = telemetry {
            eprintln!();
            eprintln!("{}", TelemetryDisplay::new(telemetry).render_summary());
        }
    }

    Ok(())
}

async fn run_recommend(
    config: &Config,
    log: &Path,
    query: &str,
    intent: &str,
    seed: Option<u64>,
) -> Result<Option<TelemetryCollector>> {
    let engine = Engine::load(log, config).await?;

    let mut selector_config = config.selector.clone();
    if seed.is_some() {
        selector_config.seed = seed;
    }

    let catalog: Arc<dyn ToolCatalog> = engine.catalog.clone();
    let selector = ToolSelector::with_config(engine.store.clone(), catalog, selector_config)
        .with_telemetry(engine.telemetry.clone());

    let recommendation = selector
        .recommend_tool(query, intent)
        .await
        .context("No tool could be recommended")?;

    print_recommendation(&recommendation);
    Ok(Some(engine.telemetry))
}

fn print_recommendation(rec: &ToolRecommendation) {
    let strategy = match rec.strategy {
        DecisionStrategy::Learned => rec.strategy.as_str().green(),
        DecisionStrategy::Exploration => rec.strategy.as_str().yellow(),
        DecisionStrategy::Fallback => rec.strategy.as_str().red(),
    };

    println!("{} {}", "Tool:".bold(), rec.tool_name.cyan().bold());
    println!("{} {} ({:.2})", "Strategy:".bold(), strategy, rec.confidence);
    println!("{} {}", "Reasoning:".bold(), rec.reasoning);
    if rec.sample_size > 0 {
        println!(
            "{} {:.1}% over {} calls, {:.0}ms avg",
            "Evidence:".bold(),
            rec.success_rate * 100.0,
            rec.sample_size,
            rec.avg_latency_ms
        );
    }
    if !rec.alternatives.is_empty() {
        println!("{} {}", "Alternatives:".bold(), rec.alternatives.join(", "));
    }
}

async fn run_stats(
    config: &Config,
    log: &Path,
    tool: &str,
    intent: &str,
) -> Result<Option<TelemetryCollector>> {
    let engine = Engine::load(log, config).await?;
    let catalog: Arc<dyn ToolCatalog> = engine.catalog.clone();
    let selector = ToolSelector::with_config(engine.store.clone(), catalog, config.selector.clone())
        .with_telemetry(engine.telemetry.clone());

    let stats = selector.get_tool_stats(tool, intent).await;

    println!("{} {} / {}", "Tool:".bold(), tool.cyan().bold(), intent);
    if stats.total_calls == 0 {
        println!("{}", "No recorded calls".dimmed());
    } else {
        println!("Calls:         {}", stats.total_calls);
        println!("Successes:     {}", stats.successes.to_string().green());
        println!("Failures:      {}", stats.failures.to_string().red());
        println!("Success rate:  {:.1}%", stats.success_rate() * 100.0);
        println!("Avg latency:   {:.0}ms", stats.avg_latency_ms());
        println!("Score:         {:.3}", stats.score());
    }
    Ok(Some(engine.telemetry))
}

async fn run_patterns(
    config: &Config,
    log: &Path,
    all: bool,
) -> Result<Option<TelemetryCollector>> {
    let engine = Engine::load(log, config).await?;
    let analyzer = engine.analyzer(config);

    analyzer.ingest_batch(&engine.experiences);

    let patterns = if all {
        analyzer.all_patterns()
    } else {
        analyzer.patterns()
    };

    if patterns.is_empty() {
        println!(
            "{}",
            format!("No error patterns in {} experiences", engine.experiences.len()).dimmed()
        );
    }

    for pattern in patterns {
        println!(
            "{} {} ({} occurrences, confidence {:.2})",
            "●".red(),
            pattern.label.bold(),
            pattern.occurrences,
            pattern.confidence
        );
        println!("  query:    {}", pattern.common_query);
        println!("  tools:    {}", pattern.common_tools(3).join(", "));
        for message in &pattern.error_messages {
            println!("  message:  {}", message.dimmed());
        }
    }
    Ok(Some(engine.telemetry))
}

async fn run_diagnose(
    config: &Config,
    log: &Path,
    query: &str,
    error: &str,
) -> Result<Option<TelemetryCollector>> {
    let engine = Engine::load(log, config).await?;
    let analyzer = engine.analyzer(config);

    match analyzer.diagnose(query, error).await {
        Some(pattern) => {
            println!("{} {}", "Known failure:".yellow().bold(), pattern.label.bold());
            println!("  seen {} times since {}", pattern.occurrences, pattern.first_seen);
            println!("  usual tool: {}", pattern.tool_name);
            for message in &pattern.error_messages {
                println!("  message:    {}", message.dimmed());
            }
        }
        None => println!("{}", "No matching error pattern".green()),
    }
    Ok(Some(engine.telemetry))
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    println!("{} {}", "Config file:".bold(), path.display());
    println!();
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to serialize config")?
    );
    Ok(())
}
