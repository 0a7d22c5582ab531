//! Request logging middleware

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Log every inbound request before it is handled
pub async fn log_request(request: Request, next: Next) -> Response {
    tracing::warn!(
        method = %request.method(),
        path = request.uri().path(),
        "Warning: {} request to {}",
        request.method(),
        request.uri().path()
    );

    next.run(request).await
}
