use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::{RunCodeRequest, RunCodeResponse};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to build HTTP client: {0}")]
    Build(reqwest::Error),
    #[error("execution backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("execution backend returned status {0}")]
    Status(u16),
}

/// Stateless bridge to the remote code execution backend
#[derive(Debug)]
pub struct ExecutorClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct BackendRequest<'a> {
    language: &'a str,
    code: &'a str,
    stdin: &'a str,
}

#[derive(Debug, Deserialize)]
struct BackendResponse {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

impl ExecutorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExecutorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ExecutorError::Build)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run source code with the given stdin and return its output
    pub async fn run(&self, request: &RunCodeRequest) -> Result<RunCodeResponse, ExecutorError> {
        let url = format!("{}/execute", self.base_url);
        let body = BackendRequest {
            language: request.lang.extension(),
            code: &request.code,
            stdin: &request.input,
        };
        debug!("Forwarding {:?} execution to {}", request.lang, url);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!("Execution backend answered {} for {}", status, url);
            return Err(ExecutorError::Status(status.as_u16()));
        }

        let result: BackendResponse = response.json().await?;
        Ok(RunCodeResponse {
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }
}
