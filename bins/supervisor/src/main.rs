//! The supervisor: sole owner of the shared region.
//!
//! Creates the region and semaphore triad, drains candidate solutions
//! FIFO, tracks the best one, and drives the cooperative shutdown —
//! triggered either by SIGINT/SIGTERM or by a zero-conflict solution
//! proving the graph 3-colorable.

use chroma_config::ChromaConfig;
use chroma_graph::Solution;
use chroma_shm::{Coordinator, RecvError, RingConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// Process-wide stop flag. The handler only stores; blocking or
/// allocating is off-limits in signal context. An interrupt also aborts
/// the coordinator's `sem_wait` with EINTR, so the flag is observed even
/// while parked on an empty ring.
static STOP: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_signal(_sig: i32) {
    STOP.store(true, Ordering::Relaxed);
}

fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGINT, handle_signal as *const () as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle_signal as *const () as libc::sighandler_t);
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_improvement(sol: &Solution) {
    let edges: Vec<String> = sol.edges().iter().map(|e| e.to_string()).collect();
    println!(
        "solution with {} edges: {}",
        sol.conflict_count(),
        edges.join(" ")
    );
}

fn main() {
    let config = match ChromaConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("supervisor: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level);

    if std::env::args().len() > 1 {
        error!("supervisor accepts no arguments");
        std::process::exit(1);
    }

    if !config.ring_capacity.is_power_of_two() {
        error!(
            capacity = config.ring_capacity,
            "ring_capacity must be a power of two"
        );
        std::process::exit(1);
    }

    install_signal_handlers();

    let mut coordinator = match Coordinator::<Solution>::create(
        &config.shm_file_path,
        RingConfig::new(config.ring_capacity),
    ) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, path = %config.shm_file_path, "could not create shared region");
            std::process::exit(1);
        }
    };
    info!(
        path = %config.shm_file_path,
        capacity = config.ring_capacity,
        "supervisor ready, waiting for generators"
    );

    let mut best = u32::MAX;
    let mut failed = false;
    while !STOP.load(Ordering::Relaxed) {
        match coordinator.recv() {
            Ok(sol) => {
                let k = sol.conflict_count();
                if k == 0 {
                    best = 0;
                    break;
                }
                if k < best {
                    best = k;
                    report_improvement(&sol);
                }
            }
            Err(RecvError::Interrupted) => break,
            Err(e) => {
                error!(%e, "receive failed");
                failed = true;
                break;
            }
        }
    }

    // Shutdown runs exactly once, on every exit path: set the flag, then
    // release every registered generator from a possible blocked wait.
    match coordinator.begin_shutdown() {
        Ok(released) => info!(released, "shutdown fan-out complete"),
        Err(e) => {
            error!(%e, "shutdown fan-out failed");
            failed = true;
        }
    }

    if best == u32::MAX {
        println!("no solution received");
    } else {
        println!("best found solution: {best} edges");
        if best == 0 {
            println!("the graph is 3-colorable!");
        }
    }

    // The supervisor is the only remover; a leaked region would block the
    // next run, so teardown failure is fatal.
    if let Err(e) = coordinator.unlink() {
        error!(%e, "could not remove shared region");
        std::process::exit(1);
    }

    if failed {
        std::process::exit(1);
    }
    info!("terminating");
}
