//! LM Studio連携モジュール
//!
//! OpenAI互換の completions エンドポイントへプロンプトを送り、
//! `choices[0].text` を返す。リトライはしない。

use super::CompletionClient;
use crate::error::{Result, SentimentError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub text: String,
}

impl CompletionResponse {
    /// 先頭候補のテキスト
    pub fn first_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| SentimentError::ApiParse("choicesが空です".into()))
    }
}

pub struct LmStudioClient {
    client: Client,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl LmStudioClient {
    pub fn new(api_url: &str, model: &str, max_tokens: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            model: model.to_string(),
            max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl CompletionClient for LmStudioClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            temperature: 0.0,
        };

        let response = self.client.post(&self.api_url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SentimentError::ApiCall(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::ApiParse(format!("completionsレスポンス: {}", e)))?;
        parsed.first_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_payload_shape() {
        let payload = CompletionRequest {
            model: "google/gemma-3-12b",
            prompt: "답:",
            max_tokens: 40,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["model"], "google/gemma-3-12b");
        assert_eq!(json["prompt"], "답:");
        assert_eq!(json["max_tokens"], 40);
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_first_text() {
        let resp: CompletionResponse =
            serde_json::from_str(r#"{"id":"cmpl-1","choices":[{"index":0,"text":" 2 0 1"}]}"#).unwrap();
        assert_eq!(resp.first_text().unwrap(), " 2 0 1");
    }

    #[test]
    fn test_first_text_empty_choices() {
        let resp: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(resp.first_text(), Err(SentimentError::ApiParse(_))));
    }
}
