//! HTTP surface: text and PDF conversion endpoints plus static file serving.

use crate::document::{DocumentAudioResult, DocumentNarrator, PdfTextExtractor};
use crate::error::ConversionError;
use crate::pipeline::TextToAudio;
use crate::store::ArtifactStore;
use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// File name offered to browsers for single-text downloads
const SPEECH_DOWNLOAD_NAME: &str = "labnotes.wav";

/// Shared context passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<TextToAudio>,
    documents: DocumentNarrator,
    static_dir: PathBuf,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(
        pipeline: Arc<TextToAudio>,
        static_dir: impl Into<PathBuf>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            documents: DocumentNarrator::new(pipeline.clone()),
            pipeline,
            static_dir: static_dir.into(),
            request_timeout,
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

/// Failure of one request, rendered as `{error, code}` JSON.
#[derive(Debug)]
pub enum ApiError {
    Conversion(ConversionError),
    BadRequest(String),
    Timeout(Duration),
}

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        Self::Conversion(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(format!("malformed form data: {}", err))
    }
}

fn status_for(err: &ConversionError) -> StatusCode {
    match err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        ConversionError::Synthesis { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Conversion(e) => (status_for(e), e.code(), e.to_string()),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "invalid_input", message.clone())
            }
            ApiError::Timeout(limit) => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                format!("conversion did not finish within {}s", limit.as_secs()),
            ),
        };

        if status.is_server_error() {
            log::error!("{} ({})", message, code);
        } else {
            log::warn!("Rejected request: {} ({})", message, code);
        }

        (
            status,
            Json(ErrorResponse {
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

/// Run a conversion under the per-request deadline. Dropping the job on
/// timeout releases its transient files.
async fn with_deadline<T>(
    limit: Duration,
    job: impl Future<Output = crate::error::Result<T>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(limit, job).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(ApiError::Timeout(limit)),
    }
}

/// Form values are "true"/"false"; anything other than "true" means false.
fn parse_merge_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// POST /text-to-audio
///
/// Multipart field `content` holds the text. Responds with the WAV file.
async fn text_to_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut content = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("content") {
            content = Some(field.text().await?);
        }
    }
    let content =
        content.ok_or_else(|| ApiError::BadRequest("missing form field 'content'".into()))?;

    let artifact = with_deadline(state.request_timeout, state.pipeline.render(&content, None)).await?;
    let bytes = state.pipeline.store().read(&artifact).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", SPEECH_DOWNLOAD_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// POST /pdf-to-audio
///
/// Multipart fields `file` (PDF bytes) and optional `merge` (default "true").
async fn pdf_to_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DocumentAudioResult>, ApiError> {
    let mut file = None;
    let mut merge = true;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => file = Some(field.bytes().await?.to_vec()),
            Some("merge") => merge = parse_merge_flag(&field.text().await?),
            _ => {}
        }
    }
    let file = file.ok_or_else(|| ApiError::BadRequest("missing form field 'file'".into()))?;
    log::info!("Received PDF of {} bytes (merge={})", file.len(), merge);

    let result = with_deadline(
        state.request_timeout,
        state
            .documents
            .render_document_bytes(file, Arc::new(PdfTextExtractor), merge),
    )
    .await?;
    Ok(Json(result))
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    Router::new()
        .route("/text-to-audio", post(text_to_audio))
        .route("/pdf-to-audio", post(pdf_to_audio))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    log::info!("Serving audio files from {}", state.static_dir.display());

    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")?;
    Ok(())
}
