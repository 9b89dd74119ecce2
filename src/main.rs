//! cascade-tuner - Cascade PID Loop Tuning Advisor
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP API
//! cascade-tuner serve --addr 0.0.0.0:8080
//!
//! # Evaluate a resampled CSV export
//! cascade-tuner evaluate --csv loop.csv --outer 1.2,2.5,0.345 --inner 0.8,0.4,0.1
//!
//! # Evaluate a synthetic window
//! cascade-tuner evaluate --synthetic oscillation --outer 1.2,2.5,0.345 --inner 0.8,0.4,0.1
//!
//! # Ask for the rule-table recommendation for a known issue
//! cascade-tuner recommend --issue sluggish --outer 1.2,2.5,0.345 --inner 0.8,0.4,0.1
//! ```
//!
//! # Environment Variables
//!
//! - `TUNER_CONFIG`: Path to the TOML config file
//! - `SERVER_ADDR`: Bind address for `serve`
//! - `TUNER_CORS_ORIGINS`: Comma-separated origins allowed cross-origin
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use cascade_tuner::acquisition::read_csv_samples;
use cascade_tuner::api::{create_app, AppState};
use cascade_tuner::synthetic::{SyntheticLoop, SyntheticPattern, DEFAULT_SEED};
use cascade_tuner::{CascadeGains, GainSet, IssueLabel, TunerConfig, TuningEngine};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "cascade-tuner")]
#[command(about = "Cascade PID loop issue detection and tuning advisor")]
#[command(version)]
struct CliArgs {
    /// Path to tuner_config.toml (otherwise $TUNER_CONFIG, then ./tuner_config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the /api/v2 HTTP API
    Serve {
        /// Bind address (overrides [server].addr)
        #[arg(short, long, env = "SERVER_ADDR")]
        addr: Option<String>,
    },

    /// Evaluate a window of loop data and print the report as JSON
    Evaluate {
        /// Resampled CSV export
        #[arg(long, conflicts_with = "synthetic", required_unless_present = "synthetic")]
        csv: Option<PathBuf>,

        /// Generate a synthetic window with the given fault pattern
        #[arg(long, value_enum)]
        synthetic: Option<SyntheticPattern>,

        /// Seed for --synthetic
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Current outer (PID1) gains as KP,KI,KD
        #[arg(long, allow_hyphen_values = true)]
        outer: GainSet,

        /// Current inner (PID2) gains as KP,KI,KD
        #[arg(long, allow_hyphen_values = true)]
        inner: GainSet,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the rule-table recommendation for an issue label
    Recommend {
        /// Issue label, e.g. oscillation, overshoot-valve-low, sluggish
        #[arg(long)]
        issue: IssueLabel,

        /// Current outer (PID1) gains as KP,KI,KD
        #[arg(long, allow_hyphen_values = true)]
        outer: GainSet,

        /// Current inner (PID2) gains as KP,KI,KD
        #[arg(long, allow_hyphen_values = true)]
        inner: GainSet,
    },
}

// ============================================================================
// Subcommands
// ============================================================================

async fn run_server(config: Arc<TunerConfig>, addr: Option<String>) -> Result<()> {
    let server_addr = addr.unwrap_or_else(|| config.server.addr.clone());
    info!(plant = %config.plant.name, "Starting HTTP server on {}", server_addr);

    let app = create_app(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;
    info!("HTTP server listening on {}", server_addr);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await;

    match result {
        Ok(()) => {
            info!("Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("HTTP server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {e}"))
        }
    }
}

fn run_evaluate(
    config: Arc<TunerConfig>,
    csv: Option<&Path>,
    synthetic: Option<SyntheticPattern>,
    seed: u64,
    gains: CascadeGains,
    output: Option<&Path>,
) -> Result<()> {
    let samples = match (csv, synthetic) {
        (Some(path), _) => read_csv_samples(path, &config.columns)
            .with_context(|| format!("Failed to load samples from {}", path.display()))?,
        (None, Some(pattern)) => {
            info!(pattern = %pattern, seed, "Generating synthetic window");
            SyntheticLoop::new(pattern).with_seed(seed).generate()
        }
        (None, None) => anyhow::bail!("either --csv or --synthetic is required"),
    };

    let engine = TuningEngine::new(config);
    let report = engine
        .evaluate_samples(samples, &gains)
        .context("Evaluation failed")?;
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), status = %report.status, "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_recommend(config: Arc<TunerConfig>, label: IssueLabel, gains: CascadeGains) -> Result<()> {
    let recommendation = TuningEngine::new(config)
        .recommend(label, &gains)
        .context("Recommendation failed")?;
    println!("{}", serde_json::to_string_pretty(&recommendation)?);
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so report JSON on stdout stays parseable.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let config = Arc::new(
        TunerConfig::load_or_search(args.config.as_deref()).context("Failed to load config")?,
    );

    match args.command {
        Command::Serve { addr } => run_server(config, addr).await,
        Command::Evaluate {
            csv,
            synthetic,
            seed,
            outer,
            inner,
            output,
        } => run_evaluate(
            config,
            csv.as_deref(),
            synthetic,
            seed,
            CascadeGains::new(outer, inner),
            output.as_deref(),
        ),
        Command::Recommend {
            issue,
            outer,
            inner,
        } => run_recommend(config, issue, CascadeGains::new(outer, inner)),
    }
}
