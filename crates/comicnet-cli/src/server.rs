//! HTTP surface: a single `POST /classify` route over a shared [`Classifier`].

use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use comicnet_ai::{Classifier, ClassifyError};
use comicnet_core::Classification;
use thiserror::Error;
use tokio::signal;
use tracing::{debug, error, info};

use crate::config::ServeArgs;

/// Per-request failure. Every variant is reported as a plain-text 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error("classification task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "classification failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

pub fn build_app(classifier: Arc<Classifier>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/classify", post(classify))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(classifier)
}

async fn classify(
    State(classifier): State<Arc<Classifier>>,
    body: Bytes,
) -> Result<Json<Classification>, AppError> {
    let bytes = body.len();
    let result = tokio::task::spawn_blocking(move || classifier.classify(&body)).await??;
    debug!(
        bytes,
        label = %result.label,
        probability = result.probability,
        "classified"
    );
    Ok(Json(result))
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(classifier: Arc<Classifier>, args: &ServeArgs) -> anyhow::Result<()> {
    let app = build_app(classifier, args.max_body_bytes);

    let bind_addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("received terminate signal, shutting down");
        },
    }
}
