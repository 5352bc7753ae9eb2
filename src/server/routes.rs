use crate::defaults::MULTIPART_OVERHEAD_BYTES;
use crate::server::{AppState, handlers};
use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/upload_audio", post(handlers::upload_audio))
        .route("/transcribe", post(handlers::transcribe))
        .route("/search_voices", get(handlers::search_voices))
        .route("/get_voice/:id", get(handlers::get_voice))
        .route("/synthesize", post(handlers::synthesize))
        .route("/download/:id", get(handlers::download))
        .route("/upload_voice", post(handlers::upload_voice))
        .route("/generate_speech", post(handlers::generate_speech))
        .route("/voices", get(handlers::list_voices))
        .route("/voices/:id", delete(handlers::delete_voice))
        .route("/jobs", post(handlers::create_job).get(handlers::list_jobs))
        .route("/jobs/:id", get(handlers::get_job))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

/// Permissive CORS; preflight requests never reach a handler.
async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    apply_cors(response.headers_mut());
    response
}
