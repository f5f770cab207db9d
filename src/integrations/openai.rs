//! OpenAI chat completions client used for answer generation.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat client.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create client with API key.
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Configuration(
                "OpenAI API key is empty".to_string(),
            ));
        }

        let http = Client::builder()
            .user_agent("docrag/0.1.0")
            .build()
            .map_err(|e| Error::Configuration(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: OPENAI_API_URL.to_string(),
        })
    }

    /// Override the API base URL (proxies, compatible servers, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Chat completion, non-streaming.
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Generation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Generation(format!(
                "OpenAI error {}: {}",
                status, text
            )));
        }

        let chat_response: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Generation(format!("Invalid response: {}", e)))?;

        chat_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| Error::Generation("Empty response from OpenAI".to_string()))
    }

    /// One system + user exchange.
    pub async fn generate(&self, system: &str, user: &str, model: &str) -> Result<String> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: Some(system.to_string()),
            },
            ChatMessage {
                role: "user".to_string(),
                content: Some(user.to_string()),
            },
        ];

        self.chat_completion(messages, model, 0.7, 1024).await
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
