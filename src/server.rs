use anyhow::{bail, Context};
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::condition::PredictionResult;
use crate::config::ServeArgs;
use crate::error::ScanError;
use crate::page::{self, PageView};
use crate::scanner::NailScanner;

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "image";

#[derive(Clone, Debug)]
pub struct AppState {
    scanner: NailScanner,
    sample_image: Option<Bytes>,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("no image was uploaded in the `{}` field", UPLOAD_FIELD)]
    MissingImage,

    #[error("invalid upload: {}", .0.body_text())]
    Rejection(MultipartRejection),

    #[error("invalid upload: {}", .0.body_text())]
    Multipart(MultipartError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("prediction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingImage => StatusCode::BAD_REQUEST,
            Self::Rejection(rejection) => rejection.status(),
            Self::Multipart(err) => err.status(),
            Self::Scan(ScanError::UnsupportedFormat) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Scan(ScanError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Scan(_) | Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `sample_image` is an example photo (JPEG or PNG) shown next to the upload form.
pub fn router(
    scanner: NailScanner,
    max_upload_bytes: usize,
    sample_image: Option<Bytes>,
) -> Router {
    Router::new()
        .route("/", get(index))
        .route(page::SAMPLE_IMAGE_PATH, get(sample_image_file))
        .route("/predict", post(predict_page))
        .route("/api/predict", post(predict_json))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            scanner,
            sample_image,
        })
}

pub async fn serve(scanner: NailScanner, args: &ServeArgs) -> anyhow::Result<()> {
    let sample_image = match &args.sample_image {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read sample image {}", path.display()))?;
            if page::preview_data_url(&bytes).is_none() {
                bail!("sample image {} is not a JPEG or PNG", path.display());
            }
            Some(Bytes::from(bytes))
        }
        None => None,
    };
    let app = router(scanner, args.max_upload_bytes(), sample_image);
    let listener = TcpListener::bind(args.listen).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&PageView {
        sample_image: state.sample_image.is_some(),
        ..Default::default()
    }))
}

async fn sample_image_file(State(state): State<AppState>) -> Response {
    let Some(bytes) = state.sample_image else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mime = match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        _ => "image/jpeg",
    };
    ([(header::CONTENT_TYPE, mime)], bytes).into_response()
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn predict_page(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> (StatusCode, Html<String>) {
    match scan_upload(&state, multipart).await {
        Ok((bytes, result)) => {
            let view = PageView {
                preview: page::preview_data_url(&bytes),
                result: Some(&result),
                error: None,
                sample_image: state.sample_image.is_some(),
            };
            (StatusCode::OK, Html(page::render(&view)))
        }
        Err(err) => {
            let message = err.to_string();
            let view = PageView {
                error: Some(&message),
                sample_image: state.sample_image.is_some(),
                ..Default::default()
            };
            (err.status(), Html(page::render(&view)))
        }
    }
}

async fn predict_json(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResult>, PredictError> {
    let (_, result) = scan_upload(&state, multipart).await?;
    Ok(Json(result))
}

async fn scan_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(Bytes, PredictionResult), PredictError> {
    let outcome = async {
        let bytes = read_upload(multipart.map_err(PredictError::Rejection)?).await?;
        let scanner = state.scanner.clone();
        let upload = bytes.clone();
        // Inference is CPU bound, keep it off the async workers
        let result = tokio::task::spawn_blocking(move || scanner.scan_bytes(&upload)).await??;
        Ok::<_, PredictError>((bytes, result))
    }
    .await;

    if let Err(err) = &outcome {
        if err.status().is_server_error() {
            error!("prediction failed: {err}");
        } else {
            warn!("rejected upload: {err}");
        }
    }
    outcome
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, PredictError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(PredictError::Multipart)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let bytes = field.bytes().await.map_err(PredictError::Multipart)?;
        if bytes.is_empty() {
            break;
        }
        return Ok(bytes);
    }
    Err(PredictError::MissingImage)
}
