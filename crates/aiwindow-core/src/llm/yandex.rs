use crate::compression::{Summarizer, SummaryRequest};
use crate::config::{YandexConfig, YandexCredentials};
use crate::core_types::TokenUsage;
use crate::errors::ChatCoreError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub model_uri: String,
    pub completion_options: CompletionOptions,
    pub messages: Vec<CompletionMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub result: CompletionResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
    #[serde(default)]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Alternative {
    pub message: CompletionMessage,
    #[serde(default)]
    pub status: Option<String>,
}

/// Summarizer backed by the YandexGPT completion endpoint.
#[derive(Debug, Clone)]
pub struct YandexGptSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    folder_id: String,
}

impl YandexGptSummarizer {
    pub fn new(credentials: YandexCredentials) -> Self {
        let defaults = YandexConfig::default();
        Self {
            client: Client::new(),
            endpoint: defaults.endpoint,
            model: defaults.model,
            api_key: credentials.api_key,
            folder_id: credentials.folder_id,
        }
    }

    /// Resolves credentials and builds a client with the configured timeout.
    pub fn from_config(config: &YandexConfig) -> Result<Self, ChatCoreError> {
        let credentials = config.resolve_credentials()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatCoreError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: credentials.api_key,
            folder_id: credentials.folder_id,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.folder_id, self.model)
    }

    pub fn build_request(&self, request: &SummaryRequest) -> CompletionRequest {
        CompletionRequest {
            model_uri: self.model_uri(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            },
            messages: vec![CompletionMessage {
                role: "user".to_string(),
                text: request.prompt.clone(),
            }],
        }
    }

    /// Sends the request and returns the summary together with the reported usage.
    pub async fn summarize_with_usage(
        &self,
        request: &SummaryRequest,
    ) -> Result<(String, Option<TokenUsage>), ChatCoreError> {
        let body = self.build_request(request);
        log::info!("Sending summarization request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .header("x-folder-id", &self.folder_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatCoreError::Cancelled(format!("Summarization request timed out: {}", e))
                } else {
                    ChatCoreError::LLMError(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ChatCoreError::LLMError(format!("Failed to read response: {}", e)))?;

        log::debug!("Yandex API response ({}): {}", status, response_text);

        if !status.is_success() {
            return Err(ChatCoreError::LLMError(format!(
                "API request failed with status {}: {}",
                status, response_text
            )));
        }

        let parsed = parse_completion(&response_text)?;
        let summary = extract_summary(&parsed)?;
        log::info!("Summary received: {}", crate::core_types::truncate_chars(&summary, 100));

        Ok((summary, parsed.result.usage))
    }
}

#[async_trait]
impl Summarizer for YandexGptSummarizer {
    async fn summarize(&self, request: SummaryRequest) -> Result<String, ChatCoreError> {
        self.summarize_with_usage(&request)
            .await
            .map(|(summary, _)| summary)
    }
}

pub fn parse_completion(body: &str) -> Result<CompletionResponse, ChatCoreError> {
    serde_json::from_str(body)
        .map_err(|e| ChatCoreError::ParsingError(format!("Invalid completion response: {}", e)))
}

/// Text of the first alternative, trimmed.
pub fn extract_summary(response: &CompletionResponse) -> Result<String, ChatCoreError> {
    response
        .result
        .alternatives
        .first()
        .map(|alt| alt.message.text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ChatCoreError::SummarizationError("Empty summary from API".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarizer() -> YandexGptSummarizer {
        YandexGptSummarizer::new(YandexCredentials {
            api_key: "key".to_string(),
            folder_id: "b1gfolder".to_string(),
        })
    }

    #[test]
    fn test_request_body_shape() {
        let request = SummaryRequest {
            prompt: "Summarize this".to_string(),
            temperature: 0.3,
            max_tokens: 500,
        };
        let body = serde_json::to_value(summarizer().build_request(&request)).unwrap();

        assert_eq!(body["modelUri"], "gpt://b1gfolder/yandexgpt-lite/latest");
        assert_eq!(body["completionOptions"]["stream"], false);
        assert_eq!(body["completionOptions"]["maxTokens"], 500);
        assert!((body["completionOptions"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["text"], "Summarize this");
    }

    #[test]
    fn test_custom_model_uri() {
        let summarizer = summarizer().with_model("yandexgpt/latest");
        assert_eq!(summarizer.model_uri(), "gpt://b1gfolder/yandexgpt/latest");
    }

    #[test]
    fn test_extracts_first_alternative() {
        let body = r#"{
            "result": {
                "alternatives": [
                    {"message": {"role": "assistant", "text": "  The user planned a trip.\n"}, "status": "ALTERNATIVE_STATUS_FINAL"}
                ],
                "usage": {"inputTextTokens": "120", "completionTokens": "14", "totalTokens": "134"},
                "modelVersion": "23.10.2024"
            }
        }"#;
        let parsed = parse_completion(body).unwrap();
        assert_eq!(extract_summary(&parsed).unwrap(), "The user planned a trip.");

        let usage = parsed.result.usage.unwrap();
        assert_eq!(usage.input_text_tokens, 120);
        assert_eq!(usage.completion_tokens, 14);
    }

    #[test]
    fn test_missing_or_blank_text_is_failure() {
        let empty = parse_completion(r#"{"result": {"alternatives": []}}"#).unwrap();
        assert_eq!(
            extract_summary(&empty).unwrap_err(),
            ChatCoreError::SummarizationError("Empty summary from API".to_string())
        );

        let blank = parse_completion(
            r#"{"result": {"alternatives": [{"message": {"role": "assistant", "text": "   "}}]}}"#,
        )
        .unwrap();
        assert!(extract_summary(&blank).is_err());
    }

    #[test]
    fn test_undecodable_body() {
        assert!(matches!(
            parse_completion("<html>502 Bad Gateway</html>"),
            Err(ChatCoreError::ParsingError(_))
        ));
    }

    #[test]
    fn test_from_config_with_explicit_credentials() {
        let config = YandexConfig {
            api_key: Some("key".to_string()),
            folder_id: Some("folder".to_string()),
            endpoint: "http://localhost:9/completion".to_string(),
            ..YandexConfig::default()
        };
        let summarizer = YandexGptSummarizer::from_config(&config).unwrap();
        assert_eq!(summarizer.model_uri(), "gpt://folder/yandexgpt-lite/latest");
        assert_eq!(summarizer.endpoint, "http://localhost:9/completion");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        let summarizer = summarizer().with_endpoint("http://127.0.0.1:9/completion");
        let request = SummaryRequest {
            prompt: "p".to_string(),
            temperature: 0.3,
            max_tokens: 10,
        };
        assert!(summarizer.summarize(request).await.is_err());
    }
}
