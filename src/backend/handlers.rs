use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::warn;
use serde_json::json;

use crate::assist::{
    AnalyzeReceiptRequest, AssistError, CategorySuggester, ReceiptAnalyzer,
    SuggestCategoryRequest, MIN_SUGGESTION_DESCRIPTION,
};
use crate::backend::AppState;

pub async fn analyze_receipt(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeReceiptRequest>,
) -> Response {
    match state.provider.analyze_receipt(payload).await {
        Ok(fields) => Json(fields).into_response(),
        Err(err) => assist_failure("receipt analysis", err),
    }
}

pub async fn suggest_category(
    State(state): State<AppState>,
    Json(payload): Json<SuggestCategoryRequest>,
) -> Response {
    if payload.description.trim().chars().count() < MIN_SUGGESTION_DESCRIPTION {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "description must be at least 3 characters" })),
        )
            .into_response();
    }

    match state.provider.suggest_category(payload).await {
        Ok(suggestion) => Json(suggestion).into_response(),
        Err(err) => assist_failure("category suggestion", err),
    }
}

fn assist_failure(flow: &str, err: AssistError) -> Response {
    warn!("{flow} failed: {err}");
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": err.to_string() }))).into_response()
}
