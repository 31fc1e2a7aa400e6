use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Languages the execution backend knows how to run
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Cpp,
    Python,
    JavaScript,
    Java,
}

impl Language {
    /// File extension the execution backend uses to pick a runtime
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::Java => "java",
        }
    }
}

/// Request body for running code
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct RunCodeRequest {
    pub lang: Language,
    pub code: String,
    #[serde(default)]
    pub input: String,
}

/// Result of running code
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Default, PartialEq)]
pub struct RunCodeResponse {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}
