use async_trait::async_trait;

/// Outcome of a command invocation.
///
/// A failed handler may still carry useful output text ("page not found"
/// is informative to the oracle). Dispatch decides fatality: an error with
/// no output aborts the loop, an error with output becomes an observation.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub output: String,
    pub error: Option<String>,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn fail_with_output(error: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// A named text-to-text capability the oracle can invoke.
///
/// `name`, `argument_label`, and `description` are rendered verbatim into
/// the system prompt's command table, so they must not contain the column
/// separator (`|`) or newlines.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;

    /// Short label for the argument, e.g. "expression" or "topic".
    fn argument_label(&self) -> &str;

    fn description(&self) -> &str;

    async fn invoke(&self, argument: &str) -> anyhow::Result<CommandResult>;
}
