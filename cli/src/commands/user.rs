use anyhow::Result;
use async_trait::async_trait;
use dialoguer::Input;
use reagent_core::{Command, CommandResult};

/// Puts a question from the oracle back to the human at the terminal.
pub struct UserCommand;

impl UserCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Command for UserCommand {
    fn name(&self) -> &str {
        "user"
    }

    fn argument_label(&self) -> &str {
        "question"
    }

    fn description(&self) -> &str {
        "Ask the user a question when information is missing or a choice is needed"
    }

    async fn invoke(&self, argument: &str) -> Result<CommandResult> {
        let prompt = argument.trim().to_string();
        let question = if prompt.is_empty() {
            "The assistant needs more input".to_string()
        } else {
            prompt
        };

        // dialoguer blocks on the terminal; keep it off the async runtime.
        let reply = tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt(question)
                .allow_empty(true)
                .interact_text()
        })
        .await??;

        if reply.trim().is_empty() {
            return Ok(CommandResult::fail_with_output(
                "empty reply",
                "The user gave no answer.",
            ));
        }
        Ok(CommandResult::ok(reply))
    }
}
