//! `imgharvest serve`: run the HTTP API until ctrl-c.

use crate::rest::{self, AppState};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Run the serve command: initialize logging, wire the engines, serve.
pub async fn run(port: u16, log_json: bool) -> Result<()> {
    init_tracing(log_json);
    info!("starting imgharvest v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::new());
    rest::start(port, state).await
}

/// Env-filtered subscriber with an `imgharvest=info` default directive.
/// JSON output is for log shippers.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("imgharvest=info".parse().unwrap());

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
