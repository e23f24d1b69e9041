//! subzero - self-play training loop for the subtraction puzzle
//!
//! A single process that:
//! 1. Runs `num_actors` MCTS self-play actors against the latest network snapshot
//! 2. Keeps their finished games in an in-memory replay window
//! 3. Trains the policy/value network on sampled positions once the window
//!    is warm, publishing snapshots back to the actors
//!
//! Ctrl+C stops actors and trainer at the next game or training step.

use anyhow::Result;
use clap::Parser;
use std::sync::atomic::Ordering;
use tokio::signal;
use tracing::{error, info, warn};

mod actor;
mod config;
mod evaluation;
mod pipeline;
mod registry;
mod replay;
mod trainer;

use crate::config::Config;
use crate::pipeline::Pipeline;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    info!(
        seed = ?config.seed(),
        network = %config.network,
        simulations = config.num_simulations,
        training_steps = config.training_steps,
        "Starting subzero"
    );

    let pipeline = Pipeline::new(config);

    // Setup graceful shutdown
    let shutdown = pipeline.shutdown_handle();
    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping self-play and training...");
                shutdown.store(true, Ordering::Relaxed);
            }
            Err(e) => warn!("Failed to listen for ctrl+c: {}", e),
        }
    });

    let run_result = pipeline.run().await;
    shutdown_handle.abort();

    match run_result {
        Ok(summary) => {
            info!(
                games = summary.games(),
                training_steps = summary.training.steps,
                final_snapshot = summary.training.final_snapshot,
                final_loss = summary.training.last_loss.map(|l| l.total),
                final_win_rate = summary.training.evaluations.last().map(|e| e.win_rate),
                "Run completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            Err(e)
        }
    }
}
