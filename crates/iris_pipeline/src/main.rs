//! Iris MLOps pipeline CLI
//!
//! Wires a managed ML-platform pipeline (train, evaluate, conditionally
//! register) for the iris classifier, provides the three step runners,
//! and drives batch inference against the registered model.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Iris MLOps pipeline
#[derive(Parser)]
#[command(name = "iris-pipeline")]
#[command(about = "Managed-platform pipeline and batch inference for the iris classifier")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the pipeline definition and upsert it to the platform
    Deploy {
        /// Start an execution after deploying (also enabled by START_EXECUTION)
        #[arg(long)]
        start: bool,
    },

    /// Train the classifier on the canned dataset (training step runner)
    Train {
        /// Number of training epochs
        #[arg(short, long, env = "TRAINING_EPOCHS", default_value = "200")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, env = "TRAINING_BATCH_SIZE", default_value = "32")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, env = "TRAINING_LEARNING_RATE", default_value = "0.05")]
        learning_rate: f64,

        /// Directory the model checkpoint is written to
        #[arg(short, long, env = "MODEL_DIR", default_value = "./model")]
        model_dir: PathBuf,
    },

    /// Evaluate a trained model and write the report (evaluation step runner)
    Evaluate {
        /// Directory the trained model is mounted at
        #[arg(short, long, env = "MODEL_CHANNEL", default_value = "./model")]
        model_channel: PathBuf,

        /// Directory the evaluation report is written to
        #[arg(short, long, env = "EVAL_OUTPUT_DIR", default_value = "./output")]
        output_dir: PathBuf,
    },

    /// Predict classes for a CSV batch (inference step runner)
    Transform {
        /// Path to the input CSV, four comma-separated measurements per line
        #[arg(short, long)]
        input: PathBuf,

        /// Path the predictions are written to, one class per line
        #[arg(short, long)]
        output: PathBuf,

        /// Directory containing the trained model
        #[arg(short, long, env = "MODEL_DIR", default_value = "./model")]
        model_dir: PathBuf,
    },

    /// Run batch inference against the latest approved registered model
    Batch,

    /// Local end-to-end sanity run: train, evaluate, verify the report
    Smoke {
        /// Number of training epochs for the quick run
        #[arg(short, long, default_value = "30")]
        epochs: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Deploy { start } => {
            commands::deploy::run(start).await?;
        }
        Commands::Train {
            epochs,
            batch_size,
            learning_rate,
            model_dir,
        } => {
            commands::train::run(&model_dir, epochs, batch_size, learning_rate)?;
        }
        Commands::Evaluate {
            model_channel,
            output_dir,
        } => {
            commands::evaluate::run(&model_channel, &output_dir)?;
        }
        Commands::Transform {
            input,
            output,
            model_dir,
        } => {
            commands::transform::run(&input, &output, &model_dir)?;
        }
        Commands::Batch => {
            platform_client::batch::run().await?;
        }
        Commands::Smoke { epochs } => {
            commands::smoke::run(epochs)?;
        }
    }

    Ok(())
}
