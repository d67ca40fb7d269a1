use crate::agent::prompt::{OBSERVATION_PREFIX, STOP_ACTION};
use crate::traits::{Oracle, OracleError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    options: OllamaOptions<'a>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions<'a> {
    temperature: f64,
    stop: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
}

/// Local, key-less oracle against an Ollama endpoint.
pub struct OllamaOracle {
    client: reqwest::Client,
    model: String,
    base_url: String,
    temperature: f64,
}

impl Default for OllamaOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaOracle {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_default();

        Self {
            client,
            model: "llama3.1".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.0,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Oracle for OllamaOracle {
    async fn request(&self, system: &str, prompt: &str) -> Result<String, OracleError> {
        let request = OllamaRequest {
            model: &self.model,
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: system,
                },
                OllamaMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            options: OllamaOptions {
                temperature: self.temperature,
                stop: vec![OBSERVATION_PREFIX.trim_end(), STOP_ACTION],
            },
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 503 {
                return Err(OracleError::Overloaded(body));
            }
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: OllamaResponse = response.json().await?;
        let content = response.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(OracleError::Empty);
        }
        Ok(content)
    }
}
