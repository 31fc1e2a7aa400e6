use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Relay diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Connection, session and process figures", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Run code on the execution backend
#[utoipa::path(
    post,
    path = "/api/run-code",
    request_body = RunCodeRequest,
    responses(
        (status = 200, description = "Program output", body = RunCodeResponse),
        (status = 502, description = "Execution backend failed", body = ErrorResponse),
        (status = 503, description = "No execution backend configured", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn run_code_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        run_code_doc,
    ),
    components(
        schemas(HealthResponse, DiagnosticsResponse, RunCodeRequest, RunCodeResponse, Language, ErrorResponse)
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
