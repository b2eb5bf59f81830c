use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
};
use serde_json::{json, Value};
use tracing::{error, warn};

const MAX_REQUEST_SIZE: u64 = 1024 * 1024; // 1MB

/// Request validation middleware
pub async fn request_validation_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    validate_content_type(&request)?;
    validate_request_size(&request)?;

    let response = next.run(request).await;
    Ok(response)
}

/// Validate content type for requests with body
fn validate_content_type(request: &Request<Body>) -> Result<(), (StatusCode, Json<Value>)> {
    let method = request.method();

    if method == "POST" || method == "PUT" || method == "PATCH" {
        let headers = request.headers();

        if let Some(content_type) = headers.get("content-type") {
            let content_type_str = content_type.to_str().unwrap_or("");

            if !content_type_str.starts_with("application/json") {
                warn!("Invalid content type: {}", content_type_str);
                return Err((
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    Json(json!({
                        "error": "Unsupported media type",
                        "message": "Content-Type must be application/json",
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                    })),
                ));
            }
        } else {
            warn!("Missing content type header");
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Missing content type",
                    "message": "Content-Type header is required for requests with body",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            ));
        }
    }

    Ok(())
}

/// Validate request size
fn validate_request_size(request: &Request<Body>) -> Result<(), (StatusCode, Json<Value>)> {
    if let Some(content_length) = request.headers().get("content-length") {
        if let Ok(length_str) = content_length.to_str() {
            if let Ok(length) = length_str.parse::<u64>() {
                if length > MAX_REQUEST_SIZE {
                    error!("Request too large: {} bytes", length);
                    return Err((
                        StatusCode::PAYLOAD_TOO_LARGE,
                        Json(json!({
                            "error": "Request too large",
                            "message": format!("Request size {} bytes exceeds maximum of {} bytes", length, MAX_REQUEST_SIZE),
                            "timestamp": chrono::Utc::now().to_rfc3339(),
                        })),
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if let Ok(value) = "nosniff".parse() {
        headers.insert("X-Content-Type-Options", value);
    }
    if let Ok(value) = "DENY".parse() {
        headers.insert("X-Frame-Options", value);
    }
    if let Ok(value) = "1; mode=block".parse() {
        headers.insert("X-XSS-Protection", value);
    }
    if let Ok(value) = "strict-origin-when-cross-origin".parse() {
        headers.insert("Referrer-Policy", value);
    }

    response
}
