use crate::config::Config;
use crate::engine::{Extraction, OcrEngine};
use crate::error::OcrError;
use crate::extractors::{AppJson, AppQuery};
use crate::loader;
use crate::ocr::OcrInvoker;
use crate::preprocessing::{PreprocessConfig, PreprocessingResult, StepTiming};
use crate::session::{EngineStatus, Session};
use crate::sessions::{self, SessionStore};
use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use image::{GenericImageView, ImageFormat};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub invoker: OcrInvoker,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<dyn OcrEngine>) -> Self {
        let sessions = SessionStore::new(config.session_ttl, config.max_sessions);
        Self {
            invoker: OcrInvoker::new(engine),
            config: Arc::new(config),
            sessions: Arc::new(sessions),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct EngineInfo {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub version: Option<String>,
    pub error: Option<String>,
    pub supported_languages: Vec<String>,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: EngineInfo,
    pub supported_formats: Vec<String>,
    pub max_file_size_bytes: usize,
    pub default_language: String,
    pub default_config: PreprocessConfig,
}

#[derive(Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub engine_version: String,
}

/// Summary of the latest preprocessing run
#[derive(Serialize)]
pub struct PreprocessResponse {
    pub width: u32,
    pub height: u32,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

impl From<&PreprocessingResult> for PreprocessResponse {
    fn from(result: &PreprocessingResult) -> Self {
        let (width, height) = result.image.dimensions();
        Self {
            width,
            height,
            total_time_ms: result.total_time_ms,
            steps: result.steps.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractStatus {
    Text,
    NoText,
}

/// OCR response
#[derive(Serialize)]
pub struct ExtractResponse {
    pub status: ExtractStatus,
    pub text: String,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

impl ExtractResponse {
    fn new(extraction: Extraction, start: Instant) -> Self {
        let processing_time_ms = start.elapsed().as_millis() as u64;
        match extraction {
            Extraction::Text(text) => Self {
                status: ExtractStatus::Text,
                text,
                warnings: Vec::new(),
                processing_time_ms,
            },
            Extraction::NoText => Self {
                status: ExtractStatus::NoText,
                text: String::new(),
                warnings: vec!["No text was extracted.".to_string()],
                processing_time_ms,
            },
        }
    }
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engine = crate::engines::create(&config);
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, engine);

    // Report the engine once at startup; sessions still check for themselves
    let invoker = state.invoker.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || invoker.check_availability()).await? {
        tracing::warn!("Serving without a working OCR engine: {}", e);
    }

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .route("/ocr", post(handle_ocr))
        .route("/sessions", post(handle_create_session))
        .route("/sessions/:id", delete(handle_delete_session))
        .route("/sessions/:id/image", post(handle_upload))
        .route(
            "/sessions/:id/config",
            get(handle_get_config).put(handle_put_config),
        )
        .route("/sessions/:id/preview", get(handle_preview))
        .route("/sessions/:id/extract", post(handle_extract))
        .route("/sessions/:id/extract.txt", get(handle_download))
        .layer(DefaultBodyLimit::max(max_file_size + MULTIPART_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run decode, preprocessing or engine work off the async workers
async fn run_blocking<T, F>(work: F) -> Result<T, OcrError>
where
    F: FnOnce() -> Result<T, OcrError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| OcrError::Internal(format!("Blocking task failed: {}", e)))?
}

/// Run one action against a stored session on the blocking pool
async fn session_action<T, F>(state: &AppState, id: &str, action: F) -> Result<T, OcrError>
where
    F: FnOnce(&mut Session) -> Result<T, OcrError> + Send + 'static,
    T: Send + 'static,
{
    let id = Uuid::parse_str(id).map_err(|_| OcrError::SessionNotFound(id.to_string()))?;
    let session = state.sessions.get(&id)?;
    run_blocking(move || sessions::with_session(&session, action)).await
}

/// Pull the `file` field out of a multipart form
async fn read_file_field(multipart: &mut Multipart, max_file_size: usize) -> Result<Bytes, OcrError> {
    let mut file_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to parse multipart", max_file_size))?
    {
        if field.name() != Some("file") {
            continue;
        }

        if let Some(mime) = field.content_type() {
            if !loader::SUPPORTED_MIME_TYPES.contains(&mime) {
                tracing::warn!("Received file with content type: {}", mime);
            }
        }

        file_data = Some(
            field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, "Failed to read file data", max_file_size))?,
        );
    }

    let data = file_data.ok_or(OcrError::MissingFile)?;

    if data.len() > max_file_size {
        tracing::warn!(size = data.len(), max = max_file_size, "Upload rejected");
        return Err(OcrError::ImageTooLarge { max: max_file_size });
    }

    Ok(data)
}

/// A body cut off by the request limit is an oversized upload, anything else a bad request
fn multipart_error(error: MultipartError, context: &str, max_file_size: usize) -> OcrError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        OcrError::ImageTooLarge { max: max_file_size }
    } else {
        OcrError::InvalidRequest(format!("{}: {}", context, error))
    }
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> Result<Json<InfoResponse>, OcrError> {
    let invoker = state.invoker.clone();
    let (availability, supported_languages) = run_blocking(move || {
        Ok((
            invoker.check_availability(),
            invoker.engine().supported_languages(),
        ))
    })
    .await?;

    let engine = state.invoker.engine();
    let (version, error) = match availability {
        Ok(version) => (Some(version), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Ok(Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: EngineInfo {
            name: engine.name().to_string(),
            description: engine.description().to_string(),
            available: version.is_some(),
            version,
            error,
            supported_languages,
        },
        supported_formats: loader::SUPPORTED_MIME_TYPES
            .iter()
            .map(|s| s.to_string())
            .collect(),
        max_file_size_bytes: state.config.max_file_size,
        default_language: state.config.language.clone(),
        default_config: PreprocessConfig::default(),
    }))
}

/// Start a session. The engine check happens here, once.
async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), OcrError> {
    let invoker = state.invoker.clone();
    let session =
        run_blocking(move || Ok(Session::start(invoker, PreprocessConfig::default()))).await?;

    let engine_version = match session.status() {
        EngineStatus::Ready { version } => version.clone(),
        EngineStatus::Unavailable { error } => return Err(error.clone()),
    };

    let session_id = state.sessions.insert(session)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            engine_version,
        }),
    ))
}

async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, OcrError> {
    let id = Uuid::parse_str(&id).map_err(|_| OcrError::SessionNotFound(id.clone()))?;
    state.sessions.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<PreprocessResponse>, OcrError> {
    let data = read_file_field(&mut multipart, state.config.max_file_size).await?;

    let summary = session_action(&state, &id, move |session| {
        session.upload(&data).map(PreprocessResponse::from)
    })
    .await?;

    Ok(Json(summary))
}

async fn handle_get_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PreprocessConfig>, OcrError> {
    let config = session_action(&state, &id, |session| Ok(session.config().clone())).await?;
    Ok(Json(config))
}

async fn handle_put_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(config): AppJson<PreprocessConfig>,
) -> Result<Json<PreprocessResponse>, OcrError> {
    let summary = session_action(&state, &id, move |session| {
        session.configure(config).map(PreprocessResponse::from)
    })
    .await?;

    Ok(Json(summary))
}

async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, OcrError> {
    let png = session_action(&state, &id, |session| {
        let preview = session.preview().ok_or(OcrError::NoImage)?;
        let mut png = Vec::new();
        preview
            .image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| OcrError::Internal(format!("Failed to encode preview: {}", e)))?;
        Ok(png)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn handle_extract(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExtractResponse>, OcrError> {
    let start = Instant::now();
    let extraction = session_action(&state, &id, |session| session.extract()).await?;
    Ok(Json(ExtractResponse::new(extraction, start)))
}

async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, OcrError> {
    let download = session_action(&state, &id, |session| session.download()).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.mime_type)
        .header(header::CONTENT_LENGTH, download.bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.file_name),
        )
        .body(Body::from(download.bytes))
        .map_err(|e| OcrError::Internal(e.to_string()))
}

/// One-shot OCR: a throwaway session that uploads, preprocesses and extracts
async fn handle_ocr(
    State(state): State<AppState>,
    AppQuery(config): AppQuery<PreprocessConfig>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, OcrError> {
    let start = Instant::now();
    let data = read_file_field(&mut multipart, state.config.max_file_size).await?;

    let invoker = state.invoker.clone();
    let extraction = run_blocking(move || {
        let mut session = Session::start(invoker, config);
        session.upload(&data)?;
        session.extract()
    })
    .await?;

    let response = ExtractResponse::new(extraction, start);
    tracing::info!(
        "OCR completed in {}ms, text length: {}",
        response.processing_time_ms,
        response.text.len()
    );

    Ok(Json(response))
}
