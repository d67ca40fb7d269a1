use crate::traits::Command;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

const TABLE_RULE: &str = "--------------------------------";

/// Outcome of dispatching a parsed action.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Text to feed back into the transcript; the loop continues.
    Observation(String),
    /// The handler failed with nothing useful to show the oracle.
    Fatal { command: String, message: String },
}

/// Immutable mapping from command name to capability. The `BTreeMap` gives
/// a stable iteration order, which keeps the rendered command table (and
/// therefore the system prompt) reproducible.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Register a command under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name().to_string(), command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Render the `command | argument | description` table substituted into
    /// the system prompt.
    pub fn render_table(&self) -> String {
        let mut rows = vec![
            String::new(),
            "command | argument | description".to_string(),
            TABLE_RULE.to_string(),
        ];
        for (name, command) in &self.commands {
            rows.push(format!(
                "{} | {} | {}",
                name,
                command.argument_label(),
                command.description()
            ));
        }
        rows.push(TABLE_RULE.to_string());
        rows.push(String::new());
        rows.join("\n")
    }

    /// Invoke `command` with `argument`.
    ///
    /// An unknown name is not an error: the oracle is steered back toward
    /// valid commands with an observation listing the full table.
    pub async fn dispatch(&self, command: &str, argument: &str) -> Dispatch {
        let Some(handler) = self.commands.get(command) else {
            debug!(%command, "unknown command, steering oracle back");
            return Dispatch::Observation(format!(
                "The command {} is not known. Please use one of the following commands:\n{}",
                command,
                self.render_table()
            ));
        };

        let result = match handler.invoke(argument).await {
            Ok(result) => result,
            Err(e) => {
                return Dispatch::Fatal {
                    command: command.to_string(),
                    message: e.to_string(),
                };
            }
        };

        if result.output.is_empty() {
            if let Some(message) = result.error {
                return Dispatch::Fatal {
                    command: command.to_string(),
                    message,
                };
            }
        }
        Dispatch::Observation(result.output)
    }
}
