//! Mistral AI chat-completions client.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ChatTurn, CompletionClient, CompletionError, TurnRole};

pub const DEFAULT_MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_MISTRAL_MODEL: &str = "mistral-medium";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

/// Client for the Mistral chat-completions endpoint.
#[derive(Clone)]
pub struct MistralClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl MistralClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_MISTRAL_BASE_URL.to_string(),
            model: DEFAULT_MISTRAL_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replaces the connect/read timeouts. Mainly for tests that need them short.
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .build()?;
        Ok(self)
    }
}

impl CompletionError {
    /// Classifies a request-level failure: timeout and connection failure are
    /// distinguished from everything HTTP-level.
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Connect(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl CompletionClient for MistralClient {
    #[instrument(skip(self, prompt, history), fields(model = %self.model, history_len = history.len()))]
    async fn get_completion(
        &self,
        prompt: &str,
        history: &[ChatTurn],
    ) -> Result<String, CompletionError> {
        let mut messages: Vec<ApiMessage> = history
            .iter()
            .map(|turn| ApiMessage {
                role: turn.role.as_str(),
                content: &turn.content,
            })
            .collect();
        messages.push(ApiMessage {
            role: TurnRole::User.as_str(),
            content: prompt,
        });

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(CompletionError::from_transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CompletionError::Auth);
        }
        if !status.is_success() {
            return Err(CompletionError::Api(status.as_u16()));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::InvalidResponse(e.to_string())
            }
        })?;

        let completion = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("no choices in response".to_string()))?;

        debug!(completion_len = completion.len(), "completion received");
        Ok(completion)
    }
}
