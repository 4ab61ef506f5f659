//! foreman CLI - drives the task engine from the command line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use foreman_core::tasks::MemoryReferenceWithCounterTask;
use foreman_core::{TaskError, TaskManager, TaskManagerConfig, TaskResult};

/// Number of progress steps each demo task goes through.
const STEPS: u64 = 10;

/// foreman - asynchronous task execution engine
#[derive(Parser, Debug)]
#[command(name = "foreman")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Engine configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit demo tasks, wait for all of them and print their details
    Run {
        /// Number of tasks to submit
        #[arg(long, default_value_t = 5)]
        tasks: usize,

        /// Simulated work per task, in milliseconds
        #[arg(long, default_value_t = 200)]
        work_ms: u64,

        /// Cancel every K-th submitted task
        #[arg(long)]
        cancel_every: Option<usize>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = match &args.config {
        Some(path) => TaskManagerConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TaskManagerConfig::default(),
    };

    match args.command {
        Command::Run {
            tasks,
            work_ms,
            cancel_every,
        } => run(config, tasks, Duration::from_millis(work_ms), cancel_every).await,
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(
    config: TaskManagerConfig,
    tasks: usize,
    work: Duration,
    cancel_every: Option<usize>,
) -> Result<()> {
    info!(?config, tasks, work_ms = work.as_millis() as u64, "starting");
    let manager = TaskManager::new(config)?;
    let step = work / STEPS as u32;

    let mut ids = Vec::with_capacity(tasks);
    for _ in 0..tasks {
        let task = MemoryReferenceWithCounterTask::new(move |counter, cancellation| async move {
            for _ in 0..STEPS {
                if cancellation.is_cancelled() {
                    return Err(TaskError::Interrupted);
                }
                tokio::time::sleep(step).await;
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            Ok(TaskResult::Completed)
        });
        ids.push(manager.submit(task).await?);
    }

    if let Some(every) = cancel_every.filter(|every| *every > 0) {
        for id in ids.iter().skip(every - 1).step_by(every) {
            manager.cancel(*id);
        }
    }

    for id in &ids {
        let details = manager.wait(*id).await?;
        println!("{}", serde_json::to_string(&details.view())?);
    }

    println!("{}", serde_json::to_string_pretty(&manager.counts_by_status())?);
    manager.close();
    Ok(())
}
