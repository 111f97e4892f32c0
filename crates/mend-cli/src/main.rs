use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mend_backend::{DialectProfile, SqlDialect};
use mend_cli::{load_catalog, Config, JsonLinesSink, MultiSink, ReplayExecutor, StdoutSink};
use mend_engine::{generator, validator, GenerationSource, MetricRunner, ValidationOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mend")]
#[command(about = "Generate, validate and self-heal dashboard metric SQL", long_about = None)]
struct Cli {
    /// Path to mend.yml (defaults apply when the file is absent)
    #[arg(long, default_value = "mend.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print generated SQL for every catalog metric without executing
    Generate(CatalogArgs),
    /// Validate a SQL string against one dialect's conformance rules
    Validate(ValidateArgs),
    /// Run the full generate/validate/execute/repair cycle over the catalog
    Run(RunArgs),
}

#[derive(Parser)]
struct CatalogArgs {
    /// Metric catalog CSV (overrides the config entry)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Parser)]
struct ValidateArgs {
    /// Dialect tag: p21/tsql or por/jet
    #[arg(long)]
    dialect: String,

    /// SQL text to validate
    sql: String,
}

#[derive(Parser)]
struct RunArgs {
    /// Metric catalog CSV (overrides the config entry)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Replay fixture YAML (overrides the config entry)
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// JSON-lines report output (overrides the config entry)
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::fallback()
    };

    match cli.command {
        Commands::Generate(args) => generate(&config, args),
        Commands::Validate(args) => validate(args),
        Commands::Run(args) => run(&config, args).await,
    }
}

fn generate(config: &Config, args: CatalogArgs) -> Result<()> {
    let catalog_path = args.catalog.unwrap_or_else(|| config.catalog.clone().into());
    let metrics =
        load_catalog(&catalog_path).with_context(|| "Failed to load metric catalog")?;
    let table_map = config.table_map()?;

    for metric in &metrics {
        let generated = generator::generate(metric, &table_map);
        let source = match generated.source {
            GenerationSource::Passthrough => "passthrough",
            GenerationSource::Template(_) => "template",
            GenerationSource::Fallback => "fallback",
        };
        println!("{} [{}] ({})", metric.id, metric.dialect, source);
        println!("  {}", generated.sql);
    }
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<()> {
    let dialect = SqlDialect::parse(&args.dialect)
        .with_context(|| format!("Unknown dialect tag '{}'", args.dialect))?;
    let profile = DialectProfile::of(dialect);

    match validator::validate(profile, &args.sql) {
        ValidationOutcome::Valid => {
            println!("valid under {}", dialect);
            Ok(())
        }
        ValidationOutcome::Invalid(kind) => {
            println!("invalid under {}: {}", dialect, kind);
            std::process::exit(1);
        }
    }
}

async fn run(config: &Config, args: RunArgs) -> Result<()> {
    let catalog_path = args.catalog.unwrap_or_else(|| config.catalog.clone().into());
    let metrics =
        load_catalog(&catalog_path).with_context(|| "Failed to load metric catalog")?;
    println!("Loaded {} metrics from {}", metrics.len(), catalog_path.display());

    let fixtures = args
        .fixtures
        .or_else(|| config.fixtures.clone().map(Into::into));
    let executor = match fixtures {
        Some(path) => {
            println!("Replaying outcomes from {}", path.display());
            ReplayExecutor::load(&path)?
        }
        None => ReplayExecutor::empty(),
    };

    let report_path = args.report.unwrap_or_else(|| config.report.clone().into());
    let sink = MultiSink::new(vec![
        Box::new(StdoutSink),
        Box::new(JsonLinesSink::create(&report_path)?),
    ]);

    let runner = MetricRunner::new(
        Arc::new(executor),
        Arc::new(sink),
        config.table_map()?,
        config.runner_options(),
    );

    let summary = runner.run_batch(&metrics).await?;

    println!();
    println!(
        "{} processed: {} ok, {} repaired, {} unrepaired, {} errors ({} fallback-generated)",
        summary.processed,
        summary.ok,
        summary.repaired,
        summary.unrepaired,
        summary.errors,
        summary.fallback_generated
    );
    println!("Reports written to {}", report_path.display());
    Ok(())
}
