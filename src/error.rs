//! The errors a health check can run into.
//!
//! Every one of these is fatal for the request it happens in: the web server logs it and answers
//! HTTP 500 with an empty body.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("No deployment was found matching: {0}")]
    DeploymentNotFound(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid name pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("BOSH task {id} ended in state: {state}")]
    TaskFailed { id: u64, state: String },

    #[error("BOSH task {id} was not done after {attempts} polls")]
    TaskTimeout { id: u64, attempts: u32 },

    #[error("Client key is blank")]
    ClientKeyBlank,

    #[error("Client cert is blank")]
    ClientCertBlank,

    #[error("CA cert is blank")]
    CaCertBlank,

    #[error("Invalid CA cert: {0}")]
    InvalidCaCert(String),

    #[error("Invalid client key pair: {0}")]
    InvalidKeyPair(#[source] reqwest::Error),

    #[error("Health check did not finish before its deadline")]
    DeadlineExceeded,

    #[error("Health check worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Unable to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<serde_json::Error> for MonitorError {
    fn from(error: serde_json::Error) -> Self {
        MonitorError::ParseError(error.to_string())
    }
}

impl From<serde_yaml::Error> for MonitorError {
    fn from(error: serde_yaml::Error) -> Self {
        MonitorError::ParseError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
