use crate::aggregate::Aggregator;
use crate::config::Config;
use crate::error::InsightsError;
use crate::models::CredentialPair;
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

impl IntoResponse for InsightsError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
        (status, body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/spotify-data", post(spotify_data))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run(cfg: &Config, aggregator: Arc<Aggregator>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.listen_addr))?;
    info!("listening on {}", cfg.listen_addr);
    axum::serve(listener, router(AppState { aggregator }))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn health() -> &'static str {
    "ok"
}

pub async fn spotify_data(
    State(state): State<AppState>,
    body: std::result::Result<Json<CredentialPair>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("spotify_data", %request_id);
    async move {
        // A missing or malformed body is reported the same as missing tokens.
        let creds = match body {
            Ok(Json(c)) => c,
            Err(_) => return InsightsError::CredentialMissing.into_response(),
        };
        match state.aggregator.insights(&creds).await {
            Ok(resp) => Json(resp).into_response(),
            Err(e) => {
                error!("Error: {}", e);
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}
