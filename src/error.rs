use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("missing Pixabay API key")]
    #[diagnostic(help(
        "pass --api-key, set PIXABAY_API_KEY, or add api_key to the config file; \
         keys are issued at https://pixabay.com/api/docs/"
    ))]
    MissingApiKey,

    #[error("Pixabay API key is still the placeholder value {0:?}")]
    #[diagnostic(help("replace it with the key from https://pixabay.com/api/docs/"))]
    PlaceholderApiKey(String),

    #[error("search request failed: {0}")]
    SearchHttp(String),

    #[error("search API returned status {status}: {message}")]
    SearchStatus { status: u16, message: String },

    #[error("failed to parse search response: {0}")]
    SearchParse(String),

    #[error("image request failed: {0}")]
    ImageHttp(String),

    #[error("image host returned status {status} for {url}")]
    ImageStatus { status: u16, url: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("base directory not found or not a directory: {0}")]
    BaseDirectoryMissing(PathBuf),

    #[error("config file not found: {0}")]
    MissingConfig(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HarvestError {
    /// 2 for the credential and relabel-base preconditions, 1 for every other fatal error.
    pub fn exit_code(&self) -> u8 {
        match self {
            HarvestError::MissingApiKey
            | HarvestError::PlaceholderApiKey(_)
            | HarvestError::BaseDirectoryMissing(_) => 2,
            _ => 1,
        }
    }
}
