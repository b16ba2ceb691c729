//! A generator: one worker process of the Monte-Carlo search.
//!
//! Parses the graph from its arguments (edges as `A-B`), attaches to the
//! supervisor's shared region, then loops: random 3-coloring, conflict
//! scan, publish. Runs until the supervisor raises the termination flag.
//! Any number of generators may run against one supervisor.

use chroma_config::ChromaConfig;
use chroma_graph::{Graph, Solution, color_trial};
use chroma_shm::Worker;
use tracing::{error, info};

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let config = match ChromaConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("generator: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level);

    let specs: Vec<String> = std::env::args().skip(1).collect();
    let graph = match Graph::from_edge_specs(&specs) {
        Ok(g) => g,
        Err(e) => {
            error!(%e, "could not parse edge list");
            std::process::exit(1);
        }
    };
    info!(
        edges = graph.edges.len(),
        vertices = graph.vertex_count,
        "generator starting"
    );

    // Workers open, never create: a missing region means no supervisor.
    let mut worker = match Worker::<Solution>::attach(&config.shm_file_path) {
        Ok(w) => w,
        Err(e) => {
            error!(
                %e,
                path = %config.shm_file_path,
                "could not attach to shared region (is the supervisor running?)"
            );
            std::process::exit(1);
        }
    };

    let mut rng = rand::thread_rng();
    let mut published = 0u64;
    let mut discarded = 0u64;
    while !worker.is_shutdown() {
        match color_trial(&graph, &mut rng) {
            Some(sol) => {
                if let Err(e) = worker.publish(sol) {
                    error!(%e, "publish failed");
                    std::process::exit(1);
                }
                published += 1;
            }
            // Conflict set too large to represent: not an error, the
            // candidate is simply dropped.
            None => discarded += 1,
        }
    }

    info!(published, discarded, "termination flag observed, exiting");
}
