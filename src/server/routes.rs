use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{error, info_span, warn, Instrument};

use crate::suggestion::{endpoint::SUGGEST_PATH, SuggestionClient, SuggestionRequest};

#[derive(Clone)]
struct AppState {
    client: Arc<SuggestionClient>,
}

pub fn router(client: Arc<SuggestionClient>) -> Router {
    Router::new()
        .route(SUGGEST_PATH, post(suggest))
        .with_state(AppState { client })
}

fn invalid_body() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request body" })),
    )
        .into_response()
}

async fn suggest(
    State(state): State<AppState>,
    body: Result<Json<SuggestionRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected suggestion request: {rejection}");
            return invalid_body();
        }
    };

    let span = info_span!("suggest", app = %request.distracting_app_name);
    match state.client.send(request).instrument(span).await {
        Ok(suggestion) => Json(suggestion).into_response(),
        Err(e) if e.is_invalid_request() => {
            warn!("Rejected suggestion request: {e}");
            invalid_body()
        }
        Err(e) => {
            error!("Error in suggestion API: {e:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to get suggestion", "details": e.to_string() })),
            )
                .into_response()
        }
    }
}
