mod client;
pub mod fusion;
mod types;

pub use client::*;
pub use types::*;

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Anything that can answer a generate request. [`OracleClient`] talks to a
/// real Ollama server; tests script their own.
pub trait GenerateBackend: Send + Sync {
    fn model_name(&self) -> &str;

    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = anyhow::Result<GenerateResponse>> + Send;
}

/// Why an oracle answer could not be used. Callers fall back rather than
/// fail on every variant.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(String),

    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle call cancelled")]
    Cancelled,

    #[error("oracle output is not JSON: {0}")]
    NotJson(String),

    #[error("oracle output is a JSON {0}, expected an object")]
    NotObject(&'static str),
}
