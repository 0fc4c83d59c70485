//! HTTP surface over [`FileStore`].
//!
//! | Route                   | Effect                                        |
//! |-------------------------|-----------------------------------------------|
//! | `POST /generate-config` | replace the config file with the JSON body    |
//! | `GET /download-config`  | download the config file                      |
//! | `POST /preview-config`  | render the JSON body without writing anything |

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{Error, ErrorKind};
use crate::store::{ConfigFile, FileStore};
use crate::value::Value;

pub const GENERATED_MESSAGE: &str = "Config generated successfully!";

#[derive(Clone)]
pub struct AppState {
    store: Arc<FileStore>,
}

impl AppState {
    pub fn new(store: FileStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Wraps a crate [`Error`] so handlers can return it directly.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError(Error::IoError(io::Error::new(io::ErrorKind::Other, err)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::MalformedInput | ErrorKind::Serialization => {
                warn!(error = %self.0, "rejected document");
                StatusCode::BAD_REQUEST
            }
            ErrorKind::NotFound => {
                debug!(error = %self.0, "download before any config was generated");
                StatusCode::NOT_FOUND
            }
            ErrorKind::Io => {
                error!(error = %self.0, "config storage failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn parse_document(body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|err| Error::MalformedInput(err.to_string()).into())
}

async fn generate_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageBody>, ApiError> {
    let document = parse_document(&body)?;
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || store.write(&document)).await??;
    Ok(Json(MessageBody {
        message: GENERATED_MESSAGE,
    }))
}

async fn preview_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let document = parse_document(&body)?;
    let text = state.store.render(&document)?;
    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )],
        text,
    ))
}

fn content_disposition(filename: &str) -> HeaderValue {
    // Only plain ASCII names go in the quoted `filename` parameter
    if filename.is_ascii() {
        let safe: String = filename
            .chars()
            .map(|c| if c == '"' || c == '\\' { '_' } else { c })
            .collect();
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe)) {
            return value;
        }
    }
    HeaderValue::from_static("attachment; filename=\"config.yaml\"")
}

async fn download_config(State(state): State<AppState>) -> Result<Response, ApiError> {
    let store = Arc::clone(&state.store);
    let ConfigFile { bytes, filename } = tokio::task::spawn_blocking(move || store.read()).await??;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/yaml"),
            ),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        bytes,
    )
        .into_response())
}

/// Builds the service for `config`.
pub fn router(config: &ServerConfig) -> Router {
    let state = AppState::new(config.store());
    let app = Router::new()
        .route("/generate-config", post(generate_config))
        .route("/preview-config", post(preview_config))
        .route("/download-config", get(download_config))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http());
    if config.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Serves `config` until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(&config);
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        addr = %listener.local_addr()?,
        config_path = %config.config_path.display(),
        "configgen listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
