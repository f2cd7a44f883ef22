//! HTTP API module - REST endpoints and WebSocket

mod websocket;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::batch::{BatchError, BatchProcessor};
use crate::dice::DieSource;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<BatchProcessor>,
    pub dice: Arc<Mutex<Box<dyn DieSource + Send>>>,
}

impl AppState {
    pub fn new(processor: BatchProcessor, dice: Box<dyn DieSource + Send>) -> Self {
        Self {
            processor: Arc::new(processor),
            dice: Arc::new(Mutex::new(dice)),
        }
    }

    /// Process one raw request
    ///
    /// The die source stays locked for the whole batch, so batches never
    /// interleave no matter how many connections are open. A panic while
    /// processing becomes an `Unexpected` error instead of a dropped reply.
    pub fn run_batch(&self, raw: &[u8]) -> Result<Value, BatchError> {
        debug!("received request: {}", String::from_utf8_lossy(raw));

        let mut dice = self.dice.lock();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.processor.handle(raw, &mut *dice)
        }))
        .unwrap_or_else(|payload| Err(BatchError::Unexpected(panic_message(payload.as_ref()))));

        if let Err(ref err) = result {
            match err {
                BatchError::Validation { index, source } => {
                    warn!("rejected roll {}: {}", index, source)
                }
                BatchError::Unexpected(_) => error!("batch failed: {}", err),
                other => warn!("rejected request: {}", other),
            }
        }
        result
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/roll", post(roll))
        .route("/ws", get(websocket::ws_handler))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answers a panicking handler with a 500 and the usual error body
fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_response as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let err = BatchError::Unexpected(panic_message(payload.as_ref()));
    error!("handler panicked: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(err.to_response())).into_response()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with no message".to_string()
    }
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "rolld",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Roll a batch posted as the request body
async fn roll(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match state.run_batch(&body) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => {
            let status = if err.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(err.to_response()))
        }
    }
}
