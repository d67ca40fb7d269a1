//! Shared test doubles: a scripted oracle and canned commands.

use crate::traits::{Command, CommandResult, Oracle, OracleError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) enum Scripted {
    Reply(String),
    Overloaded,
    Api(u16, String),
}

/// Returns scripted responses in order and records every request made.
/// Panics when the script runs out, so a test that issues an unexpected
/// extra call fails loudly.
pub(crate) struct ScriptedOracle {
    script: Mutex<VecDeque<Scripted>>,
    repeat: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedOracle {
    pub fn new<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        Self::with_script(
            replies
                .into_iter()
                .map(|r| Scripted::Reply(r.to_string()))
                .collect(),
        )
    }

    pub fn with_script(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same reply, forever.
    pub fn repeating(reply: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn systems(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn request(&self, system: &str, prompt: &str) -> Result<String, OracleError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Overloaded) => Err(OracleError::Overloaded("scripted".into())),
            Some(Scripted::Api(status, body)) => Err(OracleError::Api { status, body }),
            None => match &self.repeat {
                Some(reply) => Ok(reply.clone()),
                None => panic!("ScriptedOracle: out of replies after {} calls", self.call_count()),
            },
        }
    }
}

/// A command that always answers with the same output and counts its
/// invocations.
pub(crate) struct StubCommand {
    name: &'static str,
    output: &'static str,
    invocations: AtomicUsize,
}

impl StubCommand {
    pub fn new(name: &'static str, output: &'static str) -> Self {
        Self {
            name,
            output,
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Command for StubCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn argument_label(&self) -> &str {
        "input"
    }

    fn description(&self) -> &str {
        "stub command for tests"
    }

    async fn invoke(&self, _argument: &str) -> anyhow::Result<CommandResult> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(CommandResult::ok(self.output))
    }
}

/// A command whose handler fails, optionally still carrying output text.
pub(crate) struct FailingCommand {
    name: &'static str,
    output: Option<&'static str>,
}

impl FailingCommand {
    pub fn bare(name: &'static str) -> Self {
        Self { name, output: None }
    }

    pub fn with_output(name: &'static str, output: &'static str) -> Self {
        Self {
            name,
            output: Some(output),
        }
    }
}

#[async_trait]
impl Command for FailingCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn argument_label(&self) -> &str {
        "input"
    }

    fn description(&self) -> &str {
        "failing command for tests"
    }

    async fn invoke(&self, _argument: &str) -> anyhow::Result<CommandResult> {
        Ok(match self.output {
            Some(output) => CommandResult::fail_with_output("handler failed", output),
            None => CommandResult::fail("handler failed"),
        })
    }
}
