//! Client for an OpenAI-compatible chat-completions endpoint.

use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use crate::config::InferenceConfig;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 700;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("invalid inference base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference response has no choices[0].message.content")]
    MissingContent,
}

#[derive(Clone, Debug)]
pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let endpoint = Url::parse(&format!(
            "{}{CHAT_COMPLETIONS_PATH}",
            config.base_url.trim_end_matches('/')
        ))?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one system/user prompt pair and return the generated text.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, InferenceError> {
        let payload = chat_payload(&self.model, system_prompt, user_prompt);
        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "Sending inference request");

        let body: Value = self
            .http
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        extract_content(&body)
    }
}

fn chat_payload(model: &str, system_prompt: &str, user_prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": user_prompt},
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    })
}

fn extract_content(body: &Value) -> Result<String, InferenceError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(InferenceError::MissingContent)
}
