use anyhow::Result;
use async_trait::async_trait;
use reagent_core::{Command, CommandResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PageSummary {
    title: String,
    extract: Option<String>,
}

/// Wikipedia topic lookup through the REST summary endpoint.
pub struct WikiSearchCommand {
    client: reqwest::Client,
    base_url: String,
}

impl WikiSearchCommand {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("reagent")
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: "https://en.wikipedia.org/api/rest_v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Command for WikiSearchCommand {
    fn name(&self) -> &str {
        "wikisearch"
    }

    fn argument_label(&self) -> &str {
        "topic"
    }

    fn description(&self) -> &str {
        "wikisearch searches Wikipedia for a topic"
    }

    async fn invoke(&self, argument: &str) -> Result<CommandResult> {
        let topic = argument.trim().replace(' ', "_");
        if topic.is_empty() {
            return Ok(CommandResult::fail_with_output(
                "empty topic",
                "No topic given. Provide a topic to search Wikipedia for.",
            ));
        }

        let url = format!("{}/page/summary/{}", self.base_url, topic);
        // A transport failure is informative to the oracle, same as a
        // missing page; only empty-handed failures abort the loop.
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(CommandResult::fail_with_output(
                    e.to_string(),
                    format!("Could not reach Wikipedia for topic {argument}: {e}"),
                ));
            }
        };

        if !response.status().is_success() {
            // "Not found" is informative to the oracle; keep the loop alive.
            return Ok(CommandResult::fail_with_output(
                format!("status {}", response.status()),
                format!("Topic {argument} not found in Wikipedia"),
            ));
        }

        let summary: PageSummary = match response.json().await {
            Ok(summary) => summary,
            Err(e) => {
                return Ok(CommandResult::fail_with_output(
                    e.to_string(),
                    format!("Wikipedia returned an unreadable reply for topic {argument}: {e}"),
                ));
            }
        };
        match summary.extract {
            Some(extract) if !extract.trim().is_empty() => {
                Ok(CommandResult::ok(format!("{}: {}", summary.title, extract)))
            }
            _ => Ok(CommandResult::fail_with_output(
                "no extract",
                format!("Topic {argument} has no summary in Wikipedia"),
            )),
        }
    }
}
