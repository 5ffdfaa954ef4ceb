//! HTTP surface for the two assist flows, for frontends that do not run the
//! provider in-process. Expense data never crosses this boundary; the
//! repository stays local to each client.

mod handlers;
mod routes;

use std::sync::Arc;

use axum::{routing::get, Router};
use log::info;

use crate::assist::LlmProvider;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<LlmProvider>,
}

pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let provider = LlmProvider::new(config.assist.clone())?;
    let state = AppState { provider: Arc::new(provider) };

    let app = Router::new()
        .route("/health", get(|| async { "assist server is running" }))
        .merge(routes::api_routes())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("assist server listening on http://{}", config.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
