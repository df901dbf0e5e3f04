use anyhow::{Context, Result};
use cistern_pool::{BoundedPool, PoolMode, ResourcePool};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod demo;

use config::CliConfig;
use demo::ConnectionFactory;

/// Cistern Command Line Interface
///
/// Runs a concurrent workload against a resource pool of simulated database
/// connections and reports how many connections were opened.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,

    /// Path to a TOML configuration file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run concurrent workers sharing a connection pool
    Demo {
        /// Number of concurrent workers
        #[clap(long)]
        workers: Option<usize>,

        /// Idle connections kept (soft) or maximum connections (bounded)
        #[clap(long)]
        target_size: Option<usize>,

        /// Pool admission mode
        #[clap(long, value_enum)]
        mode: Option<ModeArg>,

        /// Upper bound of the random start delay, in milliseconds
        #[clap(long)]
        max_delay_ms: Option<u64>,

        /// Upper bound of the simulated query time, in milliseconds
        #[clap(long)]
        query_ms: Option<u64>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Soft,
    Bounded,
}

impl From<ModeArg> for PoolMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Soft => PoolMode::Soft,
            ModeArg::Bounded => PoolMode::Bounded,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Demo {
            workers,
            target_size,
            mode,
            max_delay_ms,
            query_ms,
        } => {
            if let Some(workers) = workers {
                config.demo.workers = workers;
            }
            if let Some(target_size) = target_size {
                config.pool.target_size = target_size;
            }
            if let Some(mode) = mode {
                config.pool.mode = mode.into();
            }
            if let Some(max_delay_ms) = max_delay_ms {
                config.demo.max_delay_ms = max_delay_ms;
            }
            if let Some(query_ms) = query_ms {
                config.demo.query_ms = query_ms;
            }
            run_demo(&config)
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn run_demo(config: &CliConfig) -> Result<()> {
    config
        .pool
        .validate()
        .context("invalid pool configuration")?;

    info!(
        "Starting demo with {} workers against a {:?} pool of size {}",
        config.demo.workers, config.pool.mode, config.pool.target_size
    );

    let factory = Arc::new(ConnectionFactory::default());
    let opener = Arc::clone(&factory);
    let open = move || opener.open();

    let report = match config.pool.mode {
        PoolMode::Soft => {
            let pool = ResourcePool::with_config(&config.pool, open)
                .context("failed to create resource pool")?;
            demo::run(Arc::new(pool), &config.demo)
        }
        PoolMode::Bounded => {
            let pool = BoundedPool::with_config(&config.pool, open)
                .context("failed to create resource pool")?;
            demo::run(Arc::new(pool), &config.demo)
        }
    };

    let mode = match config.pool.mode {
        PoolMode::Soft => "soft",
        PoolMode::Bounded => "bounded",
    };
    println!(
        "\n--------------------------------------------------------\n\
         Concurrency [{}], Pool size [{}], Mode [{}], Connections opened [{}]\n\
         Queries [{}], Reused [{}], Discarded [{}], Drained [{}]\n\
         --------------------------------------------------------",
        report.workers,
        config.pool.target_size,
        mode,
        factory.opened(),
        report.queries,
        report.stats.reused,
        report.stats.discarded,
        report.stats.drained,
    );

    Ok(())
}
