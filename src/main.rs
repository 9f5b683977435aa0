//! arcstate - declarative finite state machine demo
//!
//! Drives the reference localized-resource operand through its happy path
//! and prints the DOT rendering of the shared topology.

mod config;

use arcstate_localize::{LocalizedResource, ResourceEvent, ResourceEventKind, ResourceRequest};
use config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (from file if ARCSTATE_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("ARCSTATE_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            // If a config file was explicitly specified, fail on error
            if std::env::var("ARCSTATE_CONFIG").is_ok() {
                tracing::error!("Failed to load config: {}", e);
                return Err(e.into());
            }
            tracing::info!("Using default configuration");
            Config::default()
        }
    };

    tracing::info!("Starting arcstate demo");
    tracing::info!("  Graph name: {}", config.graph.name);

    let resource = LocalizedResource::new(ResourceRequest::new("hdfs://host:9000/app/job.jar"));
    tracing::info!(path = resource.request().path(), "created resource");

    use ResourceEventKind::{Localized, Release, Request};
    for kind in [Request, Localized, Release, Request] {
        resource.handle(&ResourceEvent::new(kind))?;
        tracing::info!(event = ?kind, state = ?resource.state(), "handled event");
    }
    println!();

    if config.graph.print_dot {
        let dot = arcstate_dot::export_dot(
            LocalizedResource::topology().as_ref(),
            &config.graph.name,
        );
        print!("{dot}");
    }

    Ok(())
}
