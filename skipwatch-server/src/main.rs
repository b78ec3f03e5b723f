//! HTTP API server for the skipwatch fleet monitor.
//!
//! Storage backend, listen port, and the shared update secret all come from
//! the environment; with no configuration at all the server runs against an
//! in-memory store seeded with the demo fleet.

mod api;

use std::env;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Client;
use tracing_subscriber::EnvFilter;

use skipwatch_core::service::FleetService;
use skipwatch_store_firestore::{FirestoreConfig, FirestoreStore};
use skipwatch_store_memory::MemoryStore;

use crate::api::ApiState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,skipwatch_server=info")),
        )
        .init();

    let port = env::var("PORT").unwrap_or_else(|_| "5000".into());
    let addr = format!("0.0.0.0:{port}");
    let api_key = env::var("SKIPWATCH_API_KEY").unwrap_or_else(|_| "demo-key-123".into());

    let backend = match env::var("FIRESTORE_PROJECT") {
        Ok(project_id) => {
            let client = Client::builder().user_agent("skipwatch/0.1").build()?;
            let config = FirestoreConfig {
                project_id,
                token: env::var("FIRESTORE_TOKEN").ok(),
                base_url: env::var("FIRESTORE_BASE_URL").ok(),
            };
            tracing::info!("firestore backend configured");
            FirestoreStore::backend(client, config)
        }
        Err(_) => {
            tracing::warn!("FIRESTORE_PROJECT not set - using in-memory storage");
            MemoryStore::backend()
        }
    };

    // SKIPWATCH_SEED pins every randomness-dependent path (demo fleet,
    // fill-rate jitter, navigation traffic) for reproducible demo sessions.
    let rng = match env::var("SKIPWATCH_SEED")
        .ok()
        .and_then(|raw| raw.parse().ok())
    {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let service = Arc::new(FleetService::new(backend, None, rng));

    if env::var("SKIPWATCH_SKIP_DEMO").is_err() {
        let seeded = service.seed_demo(10, Utc::now()).await?;
        tracing::info!(count = seeded, "demo bins initialized");
    }

    let state = ApiState { service, api_key };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("skipwatch api listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
