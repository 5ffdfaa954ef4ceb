use axum::{routing::post, Router};

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/assist/receipt", post(handlers::analyze_receipt))
        .route("/api/assist/category", post(handlers::suggest_category))
}
