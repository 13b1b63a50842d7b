use card_logging::{card_debug, card_error};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{GptConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::CompletionError;

/// Shown in the card in place of a completion when the call fails.
pub const INLINE_ERROR_TEXT: &str =
    "** An error occurred when calling GPT-3.<br/>** Did you configure GPT-3 in the config pane?";

#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, query: &str) -> Result<String, CompletionError>;
}

/// Runs one completion and never fails: errors become [`INLINE_ERROR_TEXT`].
pub async fn execute_query(client: &dyn CompletionClient, query: &str) -> String {
    match client.complete(query).await {
        Ok(text) => text,
        Err(err) => {
            card_error!("Error calling the completion service: {}", err);
            INLINE_ERROR_TEXT.to_string()
        }
    }
}

/// Client for the OpenAI text completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    config: GptConfig,
}

impl OpenAiCompletionClient {
    pub fn new(config: GptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GptConfig {
        &self.config
    }

    fn endpoint(&self) -> Result<Url, CompletionError> {
        let raw = format!("{}/completions", self.config.api_base().trim_end_matches('/'));
        Url::parse(&raw).map_err(|err| CompletionError::InvalidEndpoint {
            endpoint: raw.clone(),
            message: err.to_string(),
        })
    }

    fn build_client(&self) -> Result<reqwest::Client, CompletionError> {
        reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|err| CompletionError::Network(err.to_string()))
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, query: &str) -> Result<String, CompletionError> {
        if self.config.api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }
        let endpoint = self.endpoint()?;
        let client = self.build_client()?;

        let request = CompletionRequest {
            model: self.config.model(),
            prompt: query,
            temperature: self.config.temperature(),
            max_tokens: self.config.max_tokens(),
        };
        let body = serde_json::to_vec(&request)
            .map_err(|err| CompletionError::MalformedResponse(err.to_string()))?;
        card_debug!(
            "POST {} model={} max_tokens={}",
            endpoint,
            request.model,
            request.max_tokens
        );

        let response = client
            .post(endpoint)
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: CompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|err| CompletionError::MalformedResponse(err.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or(CompletionError::EmptyResponse)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        return CompletionError::Timeout;
    }
    CompletionError::Network(err.to_string())
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}
