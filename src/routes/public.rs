use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{response::IntoResponse, routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/home", get(landing))
}

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate;

async fn landing() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LandingTemplate)
}
