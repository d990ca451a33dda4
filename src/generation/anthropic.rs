/*! Anthropic messages API client.

Blocking client: units are processed one at a time, and the per-call timeout is enforced by
the HTTP client. A timed out call yields [Error::Timeout].
!*/
use std::time::Duration;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::{Generate, GenerationOptions};
use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    messages: Vec<RequestMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl<'a> MessagesRequest<'a> {
    fn new(model: &'a str, prompt: &'a str, options: &'a GenerationOptions) -> Self {
        Self {
            model,
            max_tokens: options.max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            system: options.system.as_deref(),
        }
    }
}

#[derive(Debug)]
pub struct AnthropicGenerator {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicGenerator {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Generate for AnthropicGenerator {
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Error> {
        let request = MessagesRequest::new(&self.model, prompt, options);
        debug!(
            "sending {} chars to {} (max_tokens={})",
            prompt.chars().count(),
            self.model,
            options.max_tokens
        );

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!("anthropic api error ({}): {}", status, body);
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: MessagesResponse = response.json()?;
        response
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| Error::Custom("no content in generation response".to_string()))
    }
}

/// Builder for [AnthropicGenerator].
#[derive(Debug, Clone)]
pub struct AnthropicGeneratorBuilder {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl Default for AnthropicGeneratorBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AnthropicGeneratorBuilder {
    pub fn api_key(&mut self, api_key: &str) -> &mut Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn model(&mut self, model: &str) -> &mut Self {
        self.model = model.to_string();
        self
    }

    pub fn base_url(&mut self, base_url: &str) -> &mut Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    pub fn build(&self) -> Result<AnthropicGenerator, Error> {
        let api_key = match &self.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => {
                return Err(Error::InvalidConfig(
                    "an Anthropic API key is required (--api-key or DATASET_GEN_ANTHROPIC_KEY)"
                        .to_string(),
                ))
            }
        };
        if self.model.trim().is_empty() {
            return Err(Error::InvalidConfig("model name is empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be greater than 0".to_string()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        Ok(AnthropicGenerator {
            client,
            api_key,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body() {
        let options = GenerationOptions::default();
        let request = MessagesRequest::new(DEFAULT_MODEL, "hi", &options);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert!(body.get("system").is_none());

        let options = GenerationOptions {
            system: Some("be terse".to_string()),
            ..Default::default()
        };
        let body = serde_json::to_value(&MessagesRequest::new("m", "hi", &options)).unwrap();
        assert_eq!(body["system"], "be terse");
    }

    #[test]
    fn response_body() {
        let raw = r#"{"id":"msg_1","type":"message","content":[{"type":"text","text":"[]"}],"stop_reason":"end_turn"}"#;
        let response: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.content[0].text, "[]");
    }

    #[test]
    fn builder_requires_key() {
        assert!(matches!(
            AnthropicGeneratorBuilder::default().build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(AnthropicGeneratorBuilder::default()
            .api_key("  ")
            .build()
            .is_err());
        assert!(AnthropicGeneratorBuilder::default()
            .api_key("k")
            .timeout(Duration::from_secs(0))
            .build()
            .is_err());
    }

    #[test]
    fn builder() {
        let g = AnthropicGeneratorBuilder::default()
            .api_key("k")
            .model("claude-3-haiku-20240307")
            .base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(g.model(), "claude-3-haiku-20240307");
        assert_eq!(g.base_url(), "http://localhost:8080/v1");
    }
}
