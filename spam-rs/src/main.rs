//! Command-line front end
//!
//! ```bash
//! # Classify a piece of text with the full ensemble
//! spam-rs predict --text "Congratulations, you won!"
//!
//! # Extract an mbox archive, score it and write CSV
//! spam-rs mailbox inbox.mbox --score --output predictions.csv
//!
//! # Show which models load
//! spam-rs models
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spam_rs::config::{Config, LoggingConfig};
use spam_rs::mailbox::export;
use spam_rs::pipeline::PredictionPipeline;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "spam-rs")]
#[command(about = "Ensemble spam classifier", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one message with every loaded model
    Predict {
        /// Text to classify
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Extract an mbox archive, optionally scoring it
    Mailbox {
        /// Path to the mbox file
        path: PathBuf,
        /// Label every record with the batch model
        #[arg(short, long)]
        score: bool,
        /// CSV destination
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load the configured models and list them
    Models,
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match config.format.as_str() {
        "json" => registry.with(layer.json()).init(),
        "compact" => registry.with(layer.compact()).init(),
        _ => registry.with(layer.pretty()).init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_logging(&config.logging);

    let pipeline = PredictionPipeline::new(config);

    match cli.command {
        Commands::Predict { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?,
                (None, None) => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };

            let verdict = pipeline.predict_single(&text)?;
            println!("{}", serde_json::to_string_pretty(&verdict.to_report())?);
        }
        Commands::Mailbox {
            path,
            score,
            output,
        } => {
            let output = output.or_else(|| pipeline.config().mailbox.output_path.clone());

            if score {
                let scored = pipeline.predict_mailbox_file(&path, output.as_deref())?;
                let spam = scored
                    .iter()
                    .filter(|s| s.prediction == spam_rs::Verdict::Spam)
                    .count();
                println!("{} messages, {} spam", scored.len(), spam);
            } else {
                let records = pipeline.process_mailbox(&path)?;
                if let Some(output) = output {
                    export::write_records(&output, &records)?;
                }
                println!("{} messages", records.len());
            }
        }
        Commands::Models => {
            let snapshot = pipeline.reload()?;
            if snapshot.is_degraded() {
                bail!(
                    "No models loaded from {}, predictions are degraded",
                    pipeline.config().models.models_dir.display()
                );
            }

            for model in snapshot.models() {
                let kind = if model.classifier().has_probability() {
                    "probabilistic"
                } else {
                    "label-only"
                };
                println!("{:<25} {}", model.name(), kind);
            }
            info!("{} model(s) ready", snapshot.len());
        }
    }

    Ok(())
}
