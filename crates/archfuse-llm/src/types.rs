use serde::{Deserialize, Serialize};

/// Body of an Ollama `/api/generate` call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    /// Always `"json"`: the oracle is asked for a single JSON object.
    pub format: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn json(
        model: impl Into<String>,
        system: impl Into<String>,
        prompt: impl Into<String>,
        options: GenerateOptions,
    ) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            prompt: prompt.into(),
            format: "json".to_string(),
            stream: false,
            options,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// Non-streaming reply. Only `response` is read; it holds the model's text.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub done: bool,
}
