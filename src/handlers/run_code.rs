use crate::{models::{ErrorResponse, RunCodeRequest, RunCodeResponse}, AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{error, info};

/// Run code on the remote execution backend
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunCodeRequest>,
) -> Result<(StatusCode, Json<RunCodeResponse>), (StatusCode, Json<ErrorResponse>)> {

    let Some(executor) = state.executor.as_ref() else {
        error!("Run requested but no execution backend is configured");
        return Err(ErrorResponse::reply(
            StatusCode::SERVICE_UNAVAILABLE,
            "Code execution is not available",
        ));
    };

    info!("Running {:?} code ({} bytes)", request.lang, request.code.len());
    match executor.run(&request).await {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(e) => {
            error!("Code execution failed: {}", e);
            Err(ErrorResponse::reply(StatusCode::BAD_GATEWAY, "Code execution failed"))
        }
    }
}
