use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::ErrorBody,
    models::{IngredientsInput, RecipeRequest},
    processor::RecipeProcessor,
};

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<RecipeProcessor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/recipe", post(create_recipe).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

#[axum::debug_handler]
pub async fn create_recipe(
    State(state): State<AppState>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("recipe_request", %request_id);

    async move {
        let Json(body) = match payload {
            Ok(body) => body,
            Err(rejection) => {
                tracing::info!("rejected request body: {}", rejection.body_text());
                let body = ErrorBody::new("invalid request body", "invalid_input").with_details(rejection.body_text());
                return (rejection.status(), Json(body)).into_response();
            }
        };

        match state.processor.process(IngredientsInput::from(body.ingredients)).await {
            Ok(recipe) => Json(recipe).into_response(),
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorBody::new("Method not allowed", "method_not_allowed")),
    )
        .into_response()
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found", "not_found"))).into_response()
}
