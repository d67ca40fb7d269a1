//! The ReAct state machine: reason → act → observe, repeated until the
//! oracle emits an answer marker or a hard failure occurs.

use crate::agent::compress::{CompressError, Compressor};
use crate::agent::parser::{ParseError, parse_action};
use crate::agent::prompt::{ACTION_MARKER, ANSWER_MARKER, PromptSet, render};
use crate::agent::registry::{CommandRegistry, Dispatch};
use crate::agent::transcript::Transcript;
use crate::providers::RetryPolicy;
use crate::traits::{Oracle, OracleError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Character budget for a single compressed observation.
pub const DEFAULT_OBSERVATION_BUDGET: usize = 512;
/// Estimated-token ceiling before old observations are stripped.
pub const DEFAULT_TOKEN_CEILING: usize = 14_000;
const DEFAULT_MAX_TURNS: usize = 20;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("no commands registered")]
    NoCommands,
    #[error("no answer produced within {0} turns")]
    NoAnswer(usize),
    #[error("oracle reply carried no usable action: {0}")]
    NoAction(String),
    #[error("command '{command}' failed: {message}")]
    Command { command: String, message: String },
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Compress(#[from] CompressError),
}

enum Next {
    Answer(String),
    Action(String),
}

/// Drives one question to an answer over an oracle and a read-only command
/// registry. The registry and oracle are constructed once; each `ask` call
/// owns its own transcript, so concurrent calls against the same loop are
/// safe.
pub struct ReactLoop {
    oracle: Arc<dyn Oracle>,
    registry: CommandRegistry,
    prompts: PromptSet,
    retry: RetryPolicy,
    observation_budget: usize,
    token_ceiling: usize,
    max_turns: usize,
}

impl ReactLoop {
    /// An empty registry is rejected here, not discovered mid-loop.
    pub fn new(oracle: Arc<dyn Oracle>, registry: CommandRegistry) -> Result<Self, LoopError> {
        if registry.is_empty() {
            return Err(LoopError::NoCommands);
        }
        Ok(Self {
            oracle,
            registry,
            prompts: PromptSet::default(),
            retry: RetryPolicy::default(),
            observation_budget: DEFAULT_OBSERVATION_BUDGET,
            token_ceiling: DEFAULT_TOKEN_CEILING,
            max_turns: DEFAULT_MAX_TURNS,
        })
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_observation_budget(mut self, budget: usize) -> Self {
        self.observation_budget = budget;
        self
    }

    pub fn with_token_ceiling(mut self, ceiling: usize) -> Self {
        self.token_ceiling = ceiling;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Run the loop for one question and return the final answer text.
    pub async fn ask(&self, question: &str) -> Result<String, LoopError> {
        let system = render(&self.prompts.main, &self.registry);
        let compressor =
            Compressor::new(self.oracle.clone(), self.prompts.summarize.clone())
                .with_retry(self.retry);

        info!(%question, "starting react loop");
        let reply = self
            .retry
            .request(&*self.oracle, &system, &format!("QUESTION: {question}\n"))
            .await?;

        // Oracles regularly answer trivial questions outright, despite the
        // prompt demanding at least one action. Accept it.
        if let Some(answer) = extract_answer(&reply) {
            debug!("oracle answered without taking an action");
            return Ok(answer);
        }

        let mut transcript = Transcript::new(question);
        transcript.push_reply(&reply);

        let action_line = reply
            .lines()
            .find_map(|line| line.strip_prefix(ACTION_MARKER))
            .ok_or_else(|| LoopError::NoAction(reply.clone()))?
            .to_string();

        let mut observation = self.execute(&action_line).await?;
        observation = compressor
            .shrink(
                question,
                transcript.last_thought(),
                &observation,
                self.observation_budget,
            )
            .await?;

        for turn in 0..self.max_turns {
            debug!(turn, %observation, "observed");
            // The compressor or a command may short-circuit with an answer.
            if let Some(answer) = extract_answer(&observation) {
                return Ok(answer);
            }
            transcript.push_observation(&observation);

            match self.thought_and_action(&system, &mut transcript).await? {
                Next::Answer(answer) => {
                    info!(turn, "answer produced");
                    return Ok(answer);
                }
                Next::Action(line) => {
                    let raw = self.execute(&line).await?;
                    observation = compressor
                        .shrink(
                            question,
                            transcript.last_thought(),
                            &raw,
                            self.observation_budget,
                        )
                        .await?;
                }
            }
        }

        Err(LoopError::NoAnswer(self.max_turns))
    }

    /// Ask the oracle for the next thought and action over the accumulated
    /// transcript. A reply with neither marker earns exactly one re-prompt
    /// with a trailing `ACTION:` cue before the turn fails.
    async fn thought_and_action(
        &self,
        system: &str,
        transcript: &mut Transcript,
    ) -> Result<Next, LoopError> {
        if transcript.estimated_tokens() > self.token_ceiling {
            warn!(
                tokens = transcript.estimated_tokens(),
                "context over ceiling, dropping old observations"
            );
            transcript.drop_observations();
        }

        let prompt = transcript.with_cue("THOUGHT: ");
        let reply = self.retry.request(&*self.oracle, system, &prompt).await?;
        let reply = reply.trim_matches('\n').to_string();

        if let Some(answer) = extract_answer(&reply) {
            return Ok(Next::Answer(answer));
        }
        // A marked but unparsable action body counts as no action at all;
        // both cases earn the same single re-prompt.
        if let Some(line) = usable_action(&reply) {
            transcript.push_thought(&reply);
            return Ok(Next::Action(line));
        }

        warn!("reply carried no usable action, re-prompting once");
        let cue = format!("{}\nTHOUGHT: {}\nACTION: ", transcript.as_str(), reply);
        let second = self.retry.request(&*self.oracle, system, &cue).await?;
        let second = second.trim_matches('\n').to_string();

        if let Some(answer) = extract_answer(&second) {
            return Ok(Next::Answer(answer));
        }
        // The completion of the cue is the action line itself, unless the
        // oracle restated the marker.
        let line = match usable_action(&second) {
            Some(line) => line,
            None => {
                let lead = second.lines().next().unwrap_or("").trim().to_string();
                if lead.is_empty() || parse_action(&lead).is_err() {
                    return Err(LoopError::NoAction(second));
                }
                lead
            }
        };
        transcript.push_thought(&format!("{reply}\nACTION: {line}"));
        Ok(Next::Action(line))
    }

    async fn execute(&self, action_line: &str) -> Result<String, LoopError> {
        let action = match parse_action(action_line) {
            Ok(parsed) => parsed.into_action(),
            Err(ParseError::Empty) => {
                return Err(LoopError::NoAction(action_line.to_string()));
            }
            Err(e) => {
                return Err(LoopError::NoAction(format!("{action_line}: {e}")));
            }
        };

        info!(command = %action.command, argument = %action.argument, "executing command");
        match self.registry.dispatch(&action.command, &action.argument).await {
            Dispatch::Observation(text) => Ok(text),
            Dispatch::Fatal { command, message } => Err(LoopError::Command { command, message }),
        }
    }
}

/// Text after the answer marker, if present.
fn extract_answer(text: &str) -> Option<String> {
    text.split_once(ANSWER_MARKER)
        .map(|(_, answer)| answer.trim().to_string())
}

/// Last marked action line, but only if its body actually parses.
fn usable_action(text: &str) -> Option<String> {
    let line = find_action(text)?;
    parse_action(&line).ok()?;
    Some(line)
}

/// Last `ACTION: `-marked segment of a reply, first line only.
fn find_action(text: &str) -> Option<String> {
    let idx = text.rfind(ACTION_MARKER)?;
    let rest = &text[idx + ACTION_MARKER.len()..];
    let line = rest.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::{FailingCommand, ScriptedOracle, StubCommand};

    fn calculate_registry(stub: Arc<StubCommand>) -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(stub);
        registry
    }

    #[test]
    fn empty_registry_is_rejected_at_construction() {
        let oracle = Arc::new(ScriptedOracle::new([]));
        let result = ReactLoop::new(oracle, CommandRegistry::new());
        assert!(matches!(result, Err(LoopError::NoCommands)));
    }

    #[tokio::test]
    async fn one_action_then_answer() {
        let oracle = Arc::new(ScriptedOracle::new([
            "THOUGHT: I need to calculate the answer.\nACTION: { \"command\": \"calculate\", \"args\": \"7*77\" }",
            "THOUGHT: I have the answer to the question.\nANSWER: 539",
        ]));
        let stub = Arc::new(StubCommand::new("calculate", "539"));
        let react = ReactLoop::new(oracle.clone(), calculate_registry(stub.clone())).unwrap();

        let answer = react.ask("What is 7*77?").await.unwrap();
        assert_eq!(answer, "539");
        assert_eq!(stub.invocations(), 1);
        assert_eq!(oracle.call_count(), 2);
        assert!(oracle.prompts()[0].starts_with("QUESTION: What is 7*77?"));
        assert!(oracle.prompts()[1].contains("OBSERVATION: 539"));
        assert!(oracle.prompts()[1].ends_with("THOUGHT: "));
    }

    #[tokio::test]
    async fn immediate_answer_skips_dispatch() {
        let oracle = Arc::new(ScriptedOracle::new(["ANSWER: 42"]));
        let stub = Arc::new(StubCommand::new("calculate", "539"));
        let react = ReactLoop::new(oracle.clone(), calculate_registry(stub.clone())).unwrap();

        let answer = react.ask("What is the meaning of life?").await.unwrap();
        assert_eq!(answer, "42");
        assert_eq!(stub.invocations(), 0);
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_action_marker_earns_one_reprompt() {
        let oracle = Arc::new(ScriptedOracle::new([
            "THOUGHT: let me look\nACTION: calculate 2*2",
            "THOUGHT: still thinking, no action here",
            "{ \"command\": \"calculate\", \"args\": \"4*4\" }",
            "ANSWER: 16",
        ]));
        let stub = Arc::new(StubCommand::new("calculate", "4"));
        let react = ReactLoop::new(oracle.clone(), calculate_registry(stub.clone())).unwrap();

        let answer = react.ask("q").await.unwrap();
        assert_eq!(answer, "16");
        // Exactly one re-prompt, carrying the trailing ACTION: cue.
        assert!(oracle.prompts()[2].ends_with("ACTION: "));
        assert_eq!(stub.invocations(), 2);
    }

    #[tokio::test]
    async fn malformed_action_body_earns_reprompt() {
        // Marker present but the body does not parse; same recovery as a
        // missing marker.
        let oracle = Arc::new(ScriptedOracle::new([
            "THOUGHT: start\nACTION: calculate 1+1",
            "THOUGHT: hm\nACTION: {broken",
            "{ \"command\": \"calculate\", \"args\": \"2*2\" }",
            "ANSWER: done",
        ]));
        let stub = Arc::new(StubCommand::new("calculate", "2"));
        let react = ReactLoop::new(oracle.clone(), calculate_registry(stub.clone())).unwrap();

        let answer = react.ask("q").await.unwrap();
        assert_eq!(answer, "done");
        assert!(oracle.prompts()[2].ends_with("ACTION: "));
        assert_eq!(stub.invocations(), 2);
    }

    #[tokio::test]
    async fn malformed_action_after_reprompt_is_fatal() {
        let oracle = Arc::new(ScriptedOracle::new([
            "THOUGHT: start\nACTION: calculate 1+1",
            "THOUGHT: hm\nACTION: {broken",
            "{still broken",
        ]));
        let stub = Arc::new(StubCommand::new("calculate", "2"));
        let react = ReactLoop::new(oracle.clone(), calculate_registry(stub)).unwrap();

        let err = react.ask("q").await.unwrap_err();
        assert!(matches!(err, LoopError::NoAction(_)));
        // Exactly one recovery attempt before giving up.
        assert_eq!(oracle.call_count(), 3);
    }

    #[tokio::test]
    async fn unknown_command_keeps_the_loop_alive() {
        let oracle = Arc::new(ScriptedOracle::new([
            "THOUGHT: try something odd\nACTION: teleport home",
            "THOUGHT: back on track\nANSWER: done",
        ]));
        let stub = Arc::new(StubCommand::new("calculate", "539"));
        let react = ReactLoop::new(oracle.clone(), calculate_registry(stub)).unwrap();

        let answer = react.ask("q").await.unwrap();
        assert_eq!(answer, "done");
        // The steering observation lists the known commands.
        assert!(oracle.prompts()[1].contains("The command teleport is not known"));
    }

    #[tokio::test]
    async fn fatal_command_failure_aborts() {
        let oracle = Arc::new(ScriptedOracle::new([
            "THOUGHT: go\nACTION: broken now",
        ]));
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(FailingCommand::bare("broken")));
        let react = ReactLoop::new(oracle, registry).unwrap();

        let err = react.ask("q").await.unwrap_err();
        assert!(matches!(err, LoopError::Command { .. }));
    }

    #[tokio::test]
    async fn turn_ceiling_yields_no_answer() {
        let oracle = Arc::new(ScriptedOracle::repeating(
            "THOUGHT: once more\nACTION: calculate 1+1",
        ));
        let stub = Arc::new(StubCommand::new("calculate", "2"));
        let react = ReactLoop::new(oracle, calculate_registry(stub))
            .unwrap()
            .with_max_turns(3);

        let err = react.ask("q").await.unwrap_err();
        assert!(matches!(err, LoopError::NoAnswer(3)));
    }

    #[tokio::test]
    async fn answer_inside_observation_short_circuits() {
        let oracle = Arc::new(ScriptedOracle::new([
            "THOUGHT: ask the room\nACTION: respond hello",
        ]));
        let stub = Arc::new(StubCommand::new("respond", "ANSWER: hello back"));
        let react = ReactLoop::new(oracle, calculate_registry(stub)).unwrap();

        let answer = react.ask("q").await.unwrap();
        assert_eq!(answer, "hello back");
    }

    #[tokio::test]
    async fn oversized_transcript_drops_observations() {
        let filler = "x".repeat(3_000);
        let first = format!("THOUGHT: dig\nACTION: fetch {filler}");
        let oracle = Arc::new(ScriptedOracle::with_script(vec![
            crate::agent::test_support::Scripted::Reply(first),
            crate::agent::test_support::Scripted::Reply(
                "THOUGHT: enough\nANSWER: done".to_string(),
            ),
        ]));
        let stub = Arc::new(StubCommand::new("fetch", "short result"));
        let react = ReactLoop::new(oracle.clone(), calculate_registry(stub))
            .unwrap()
            .with_token_ceiling(100);

        let answer = react.ask("q").await.unwrap();
        assert_eq!(answer, "done");
        // The ceiling was exceeded before the second oracle call, so the
        // observation line was stripped from the prompt.
        assert!(!oracle.prompts()[1].contains("OBSERVATION: short result"));
    }

    #[tokio::test]
    async fn unparsable_first_reply_is_fatal() {
        let oracle = Arc::new(ScriptedOracle::new(["just rambling, no markers at all"]));
        let stub = Arc::new(StubCommand::new("calculate", "539"));
        let react = ReactLoop::new(oracle, calculate_registry(stub)).unwrap();

        let err = react.ask("q").await.unwrap_err();
        assert!(matches!(err, LoopError::NoAction(_)));
    }
}
