use crate::GenerateBackend;
use crate::types::*;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            // Ollama default
            base_url: "http://localhost:11434".to_string(),
            model: "llama3:instruct".to_string(),
        }
    }
}

pub struct OracleClient {
    config: OracleConfig,
    http: reqwest::Client,
}

impl OracleClient {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Check that the oracle answers at all. Lists installed models rather
    /// than generating, so a cold model is not loaded just to be pinged.
    pub async fn ping(&self) -> Result<()> {
        let url = self.url("/api/tags");
        let response = self
            .http
            .get(&url)
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("Oracle unreachable at {}", self.config.base_url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Oracle ping failed ({})", status);
        }
        Ok(())
    }
}

impl GenerateBackend for OracleClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let url = self.url("/api/generate");

        debug!(
            "Oracle request to {}: system={} prompt={} chars",
            url,
            request.system.len(),
            request.prompt.len()
        );

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to oracle")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Oracle request failed ({}): {}", status, error_text);
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse oracle response")?;

        info!(
            "Oracle response: model={:?}, done={}, {} chars",
            generated.model,
            generated.done,
            generated.response.len()
        );

        Ok(generated)
    }
}
