//! distlock Simulation Binary
//!
//! Runs the lock protocol against an in-memory config server: many
//! contenders race for one lock, the winner is overtaken, stale and current
//! tokens are released, and a primary step-down is detected.

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use distlock::store::MemoryConfigServer;
use distlock::{CatalogConfig, LockCatalog, LockError, LockRecord, LockSessionId, ReplSetLockCatalog};
use tracing_subscriber::{fmt, EnvFilter};

/// distlock contention simulator
#[derive(Parser, Debug)]
#[command(name = "distlock-sim")]
#[command(about = "Simulate distributed lock contention against an in-memory config server")]
#[command(version)]
struct Args {
    /// Name of the contended lock
    #[arg(short, long, default_value = "balancer")]
    lock: String,

    /// Number of concurrent contenders
    #[arg(short, long, default_value = "8")]
    contenders: usize,

    /// Write concern timeout in milliseconds
    #[arg(short, long, default_value = "15000")]
    wtimeout_ms: u64,

    /// Reason recorded with each acquisition
    #[arg(short, long, default_value = "simulated contention")]
    reason: String,
}

/// One contender's outcome
type Attempt = (String, LockSessionId, distlock::Result<Option<LockRecord>>);

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,distlock=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("distlock simulator v{}", distlock::VERSION);
    tracing::info!("Lock: {}, contenders: {}", args.lock, args.contenders);

    if let Err(e) = run(&args) {
        tracing::error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> distlock::Result<()> {
    let server = Arc::new(MemoryConfigServer::new());
    let config = CatalogConfig::builder()
        .write_concern_timeout_ms(args.wtimeout_ms)
        .build()?;
    let catalog = ReplSetLockCatalog::with_gateway(Arc::clone(&server), config);

    let epoch = catalog.get_server_info()?;
    tracing::info!("Primary election id: {}", epoch.election_id);

    // -------------------------------------------------------------------------
    // Contention
    // -------------------------------------------------------------------------
    let (tx, rx) = crossbeam::channel::unbounded::<Attempt>();
    crossbeam::thread::scope(|s| {
        for i in 0..args.contenders {
            let tx = tx.clone();
            let catalog = &catalog;
            s.spawn(move |_| {
                let process = format!("sim-process-{}", i);
                let session = LockSessionId::new();
                let outcome = catalog.ping(&process, Utc::now()).and_then(|_| {
                    catalog.grab_lock(
                        &args.lock,
                        session,
                        &format!("sim-thread-{}", i),
                        &process,
                        Utc::now(),
                        &args.reason,
                    )
                });
                let _ = tx.send((process, session, outcome));
            });
        }
    })
    .map_err(|_| LockError::Execution("contender thread panicked".to_string()))?;
    drop(tx);

    let mut winners = Vec::new();
    for (process, session, outcome) in rx.iter() {
        match outcome? {
            Some(record) => {
                tracing::info!("{} acquired {} with session {}", process, record.name, session);
                winners.push(session);
            }
            None => tracing::info!("{} lost the race", process),
        }
    }

    let holder = match winners.as_slice() {
        [only] => *only,
        other => {
            tracing::error!("Expected exactly one winner, got {}", other.len());
            std::process::exit(2);
        }
    };

    // -------------------------------------------------------------------------
    // Takeover and release
    // -------------------------------------------------------------------------
    let reaper = LockSessionId::new();
    let overtaken = catalog.overtake_lock(
        &args.lock,
        reaper,
        holder,
        "sim-main",
        "sim-reaper",
        Utc::now(),
        "holder presumed dead",
    )?;
    match overtaken {
        Some(_) => tracing::info!("Overtook {} from session {}", args.lock, holder),
        None => tracing::warn!("Lock {} changed hands before takeover", args.lock),
    }

    // The former holder's token no longer matches anything.
    catalog.unlock(holder)?;
    catalog.unlock(reaper)?;
    tracing::info!("Released {}", args.lock);

    // -------------------------------------------------------------------------
    // Fail-over detection
    // -------------------------------------------------------------------------
    server.step_down();
    let after = catalog.get_server_info()?;
    if after.has_failed_over_since(&epoch) {
        tracing::warn!(
            "Primary changed ({} -> {}); locks taken before {} must be re-validated",
            epoch.election_id,
            after.election_id,
            after.server_time
        );
    }

    tracing::info!("Simulation complete");
    Ok(())
}
