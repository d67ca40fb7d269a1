use crate::agent::prompt::{OBSERVATION_PREFIX, THOUGHT_MARKER};

/// The loop's working memory: one growing text buffer holding every labeled
/// turn, sent to the oracle in full on each step. Append-only; a line is
/// never rewritten once pushed. Created fresh per `ask` call.
#[derive(Debug, Clone)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    pub fn new(question: &str) -> Self {
        Self {
            text: format!("QUESTION: {question}"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Append a raw oracle reply (thought + action lines).
    pub fn push_reply(&mut self, reply: &str) {
        self.text.push('\n');
        self.text.push_str(reply.trim_matches('\n'));
    }

    /// Append a reply under a leading `THOUGHT:` label.
    pub fn push_thought(&mut self, thought: &str) {
        self.text.push_str("\nTHOUGHT: ");
        self.text.push_str(thought.trim_matches('\n'));
    }

    pub fn push_observation(&mut self, observation: &str) {
        self.text.push('\n');
        self.text.push_str(OBSERVATION_PREFIX);
        self.text.push_str(observation);
    }

    /// The transcript followed by a trailing cue (`"THOUGHT: "` or
    /// `"ACTION: "`) for the oracle to complete.
    pub fn with_cue(&self, cue: &str) -> String {
        format!("{}\n{}", self.text, cue)
    }

    /// Documented approximation, not exact tokenization.
    pub fn estimated_tokens(&self) -> usize {
        self.text.len() / 4
    }

    /// Strip all observation lines, trading recall of old tool outputs for
    /// guaranteed delivery once the context ceiling is hit.
    pub fn drop_observations(&mut self) {
        self.text = self
            .text
            .lines()
            .filter(|line| !line.starts_with(OBSERVATION_PREFIX))
            .collect::<Vec<_>>()
            .join("\n");
    }

    /// Most recent reasoning line, used to focus compression.
    pub fn last_thought(&self) -> Option<&str> {
        self.text
            .lines()
            .rev()
            .find(|line| line.contains(THOUGHT_MARKER))
            .map(str::trim)
    }
}
