use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TraceContextExt;
use std::{sync::Arc, time::Instant};
use tracing::{error, info, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::Metrics;

/// Middleware for automatic request tracing and metrics collection
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();

    // Extract User-Agent header
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Extract client IP from various headers (X-Forwarded-For, X-Real-IP, or connection info)
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next()) // Take first IP if multiple
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .unwrap_or("unknown")
        .trim()
        .to_string();

    // Try to get the matched path for better endpoint grouping
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_string())
        .unwrap_or_else(|| uri.clone());

    // Create a span with the actual endpoint name instead of generic middleware name
    let span_name = format!("{} {}", method, endpoint);

    let span = tracing::info_span!(
        target: "dinebook_rs::http",
        "{}", span_name,
        otel.name = %span_name,
        otel.kind = "server",
        http.method = %method,
        http.route = %endpoint,
        http.url = %uri,
        http.user_agent = %user_agent,
        http.client_ip = %client_ip,
        client.address = %client_ip,
        http.status_code = tracing::field::Empty,
        http.response.status_code = tracing::field::Empty,
        http.response_time_ms = tracing::field::Empty,
        response.status = tracing::field::Empty,
    );

    // Execute the rest of the middleware within this span
    async {
        // Increment in-flight requests
        metrics.increment_in_flight(&method, &endpoint);

        // Get trace ID from current span context (after entering the span)
        let trace_id = tracing::Span::current()
            .context()
            .span()
            .span_context()
            .trace_id()
            .to_string();

        info!(trace_id = %trace_id, method = %method, path = %endpoint, user_agent = %user_agent, client_ip = %client_ip, "Processing request");

        // Process the request
        let response = next.run(request).await;

        // Calculate duration
        let duration = start_time.elapsed();
        let duration_seconds = duration.as_secs_f64();
        let duration_ms = duration.as_millis();

        // Get status code
        let status_code = response.status().as_u16();

        // Record additional span attributes with proper X-Ray format
        tracing::Span::current().record("http.status_code", status_code);
        tracing::Span::current().record("http.response.status_code", status_code);
        tracing::Span::current().record("http.response_time_ms", duration_ms);
        tracing::Span::current().record("response.status", status_code);

        // Set span status based on HTTP status code for X-Ray
        let current_span = tracing::Span::current();
        let span_context = current_span.context();
        let otel_span = span_context.span();
        if status_code >= 400 {
            otel_span.set_status(opentelemetry::trace::Status::error("HTTP error"));
        } else {
            otel_span.set_status(opentelemetry::trace::Status::Ok);
        }

        // Record metrics
        metrics.record_http_request(&method, &endpoint, status_code, duration_seconds);

        // Decrement in-flight requests
        metrics.decrement_in_flight(&method, &endpoint);

        // Log request completion with trace ID
        if status_code >= 400 {
            error!(
                trace_id = %trace_id,
                method = %method,
                path = %endpoint,
                status_code = status_code,
                duration_ms = duration_ms,
                user_agent = %user_agent,
                client_ip = %client_ip,
                "Request completed with error"
            );
        } else {
            info!(
                trace_id = %trace_id,
                method = %method,
                path = %endpoint,
                status_code = status_code,
                duration_ms = duration_ms,
                user_agent = %user_agent,
                client_ip = %client_ip,
                "Request completed successfully"
            );
        }

        response
    }
    .instrument(span)
    .await
}
