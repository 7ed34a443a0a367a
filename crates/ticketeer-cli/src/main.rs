//! Ticketeer command line driver.
//!
//! Builds a registry, runs one or more claim drivers against it and prints
//! what happened.
//!
//! ```bash
//! ticketeer --tick-delay-ms 100
//! ticketeer --drivers 4 --tick-delay-ms 10 --board
//! ticketeer --config run.json --json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ticketeer_core::app::{AdvancePolicy, DriverGroup, PulseReaper, RunReport};
use ticketeer_core::config::AppConfig;
use ticketeer_core::impls::{FanoutPresenter, RecordingPresenter, TracingPresenter};
use ticketeer_core::observability::ClaimCounts;
use ticketeer_core::ports::{Presenter, SystemClock, UlidGenerator};

/// When the claim cursor moves forward.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Advance {
    /// After every attempt.
    Always,
    /// Only after a contended attempt.
    OnFailure,
}

impl From<Advance> for AdvancePolicy {
    fn from(advance: Advance) -> Self {
        match advance {
            Advance::Always => AdvancePolicy::Always,
            Advance::OnFailure => AdvancePolicy::OnFailure,
        }
    }
}

/// Sharded ticket claim simulator.
#[derive(Parser, Debug)]
#[command(name = "ticketeer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of tickets to create.
    #[arg(long)]
    tickets: Option<usize>,

    /// Number of shards.
    #[arg(long)]
    shards: Option<usize>,

    /// Claims each driver attempts.
    #[arg(long)]
    max_claims: Option<usize>,

    /// Delay between ticks in milliseconds.
    #[arg(long)]
    tick_delay_ms: Option<u64>,

    /// Number of concurrent drivers.
    #[arg(long)]
    drivers: Option<usize>,

    /// Cursor advance policy.
    #[arg(long, value_enum)]
    advance: Option<Advance>,

    /// Print the run reports and ticket counts as JSON.
    #[arg(long)]
    json: bool,

    /// Print a ticket board after the run.
    #[arg(long)]
    board: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_path(path)?,
            None => AppConfig::default(),
        };
        if let Some(v) = self.tickets {
            config.num_tickets = v;
        }
        if let Some(v) = self.shards {
            config.num_shards = v;
        }
        if let Some(v) = self.max_claims {
            config.max_claims = v;
        }
        if let Some(v) = self.tick_delay_ms {
            config.tick_delay_ms = v;
        }
        if let Some(v) = self.drivers {
            config.drivers = v;
        }
        if let Some(v) = self.advance {
            config.advance = v.into();
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[derive(serde::Serialize)]
struct Summary<'a> {
    reports: &'a [RunReport],
    counts: ClaimCounts,
}

const BOARD_WIDTH: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let json = args.json;
    let board = args.board;
    let config = args.into_config()?;

    let clock = Arc::new(SystemClock);
    let id_gen = UlidGenerator::new(SystemClock);
    let recorder = Arc::new(RecordingPresenter::new());
    let presenters: Vec<Arc<dyn Presenter>> = vec![
        Arc::new(TracingPresenter) as Arc<dyn Presenter>,
        recorder.clone(),
    ];
    let presenter = FanoutPresenter::new(presenters);

    let registry = Arc::new(
        config
            .registry_builder()
            .presenter(Arc::new(presenter))
            .clock(clock)
            .build(&id_gen)
            .context("failed to build registry")?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = PulseReaper::new(registry.clone(), config.reaper_interval())
        .spawn(shutdown_rx.clone());

    let group = DriverGroup::spawn(
        config.drivers,
        registry.clone(),
        &id_gen,
        config.cadence(),
        |_| config.process(),
        shutdown_rx,
    );
    info!(drivers = group.len(), "drivers started");

    let join = group.join();
    tokio::pin!(join);
    let results = tokio::select! {
        results = &mut join => results,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, stopping drivers");
            let _ = shutdown_tx.send(true);
            join.await
        }
    };

    let _ = shutdown_tx.send(true);
    reaper.await.context("pulse reaper panicked")?;

    let mut reports = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                error!(error = %e, "driver failed");
            }
        }
    }

    let counts = registry.counts();
    if json {
        let summary = Summary {
            reports: &reports,
            counts,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for report in &reports {
            println!(
                "{}: ticks={} claimed={} contended={}{}",
                report.run_id,
                report.ticks,
                report.state.claimed,
                report.state.contended,
                if report.cancelled { " (cancelled)" } else { "" },
            );
        }
        println!(
            "tickets: {} available, {} claimed",
            counts.available, counts.claimed
        );
    }

    if board {
        let cells = recorder.board(registry.len());
        for row in cells.chunks(BOARD_WIDTH) {
            let line: String = row.iter().map(|c| c.glyph()).collect();
            println!("{line}");
        }
    }

    if failures > 0 {
        bail!("{failures} driver(s) failed");
    }
    Ok(())
}
