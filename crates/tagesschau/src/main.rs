use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use tagesschau_core::classifier::{HttpClassifier, ZeroShotClassifier};
use tagesschau_core::config::{OutputFormat, PipelineConfig};
use tagesschau_core::pipeline::{load_input, AbortSignal, EpisodePipeline};
use tagesschau_core::summary::RunSummary;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tagesschau episode normalization and topic classification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline over a scraped episode CSV
    Run(RunArgs),
    /// Validate and print the configured category set
    Categories(ConfigArgs),
    /// Parse, normalize and deduplicate an input without classifying or writing
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Scraped episode table (CSV with a header row)
    #[arg(long)]
    input: PathBuf,
    /// Directory receiving the output tables and run_summary.json
    #[arg(long)]
    output_dir: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `output.format` from the config file
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Overrides `classifier.concurrency` from the config file
    #[arg(long)]
    concurrency: Option<usize>,
    /// Leave the category column empty instead of calling the classifier
    #[arg(long)]
    skip_classification: bool,
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(long)]
    input: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Categories(args) => {
            let config = load_config(args.config.as_deref())?;
            let categories = config.validate().context("category set is invalid")?;
            for (idx, label) in categories.labels().iter().enumerate() {
                println!("{:>2}  {label}", idx + 1);
            }
            Ok(())
        }
        Command::Check(args) => {
            let pipeline = EpisodePipeline::new(PipelineConfig::default())?;
            let table = load_input(&args.input)
                .with_context(|| format!("failed to load {}", args.input.display()))?;
            let stage = pipeline.episodes(&table, Some(args.input.display().to_string()))?;
            print_summary(&stage.summary);
            for rejected in &stage.summary.temporal.rejected_samples {
                println!(
                    "rejected row {}: '{}' / '{}': {}",
                    rejected.row_index, rejected.time_text, rejected.date, rejected.reason
                );
            }
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(concurrency) = args.concurrency {
        config.classifier.concurrency = concurrency;
    }

    let pipeline = EpisodePipeline::new(config).context("configuration rejected")?;
    let classifier = if args.skip_classification {
        warn!("classification disabled by --skip-classification");
        None
    } else {
        let classifier_config = &pipeline.config().classifier;
        let endpoint = classifier_config.endpoint.clone().context(
            "classifier endpoint missing: set classifier.endpoint, TAGESSCHAU_CLASSIFIER_URL or pass --skip-classification",
        )?;
        Some(HttpClassifier::new(endpoint, classifier_config.token()))
    };

    let table = load_input(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    let (interrupt, abort) = AbortSignal::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current stage");
            let _ = interrupt.send(true);
        }
    });

    let output = pipeline
        .run(
            &table,
            Some(args.input.display().to_string()),
            classifier.as_ref().map(|c| c as &dyn ZeroShotClassifier),
            &abort,
        )
        .await?;

    if abort.is_raised() {
        anyhow::bail!("interrupted before writing outputs");
    }
    let artifacts = pipeline
        .persist(&output, &args.output_dir)
        .with_context(|| format!("failed to write outputs to {}", args.output_dir.display()))?;

    info!(
        episodes = %artifacts.episodes.display(),
        topics = %artifacts.topics.display(),
        reoccurring = %artifacts.reoccurring.display(),
        summary = %artifacts.summary.display(),
        "run complete"
    );
    print_summary(&output.summary);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["metric", "value"]);
    for (metric, value) in summary.report_rows() {
        table.add_row(vec![metric, value]);
    }
    println!("{table}");
}
