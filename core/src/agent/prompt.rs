use crate::agent::registry::CommandRegistry;

/// Marker the oracle emits before its final answer.
pub const ANSWER_MARKER: &str = "ANSWER:";
/// Marker the oracle emits before a command invocation.
pub const ACTION_MARKER: &str = "ACTION: ";
/// Prefix for reasoning lines.
pub const THOUGHT_MARKER: &str = "THOUGHT:";
/// Prefix for tool results fed back into the transcript.
pub const OBSERVATION_PREFIX: &str = "OBSERVATION: ";
/// Terminator appended to every action line; also a provider stop sequence.
pub const STOP_ACTION: &str = "STOP_ACTION";
/// Sentinel a summarization call may answer when a chunk holds nothing
/// relevant. Stripped from combined summaries.
pub const EMPTY_SENTINEL: &str = "EMPTY";

/// Placeholder in the main template replaced by the rendered command table.
const COMMANDS_PLACEHOLDER: &str = "{commands}";

const MAIN_TEMPLATE: &str = r#"You are a very helpful assistant. You run in a loop
seeking additional information to fully answer the user's question until you
have all information to fully answer the user's question. You must iterate
through the loop at least once.

The commands you are seeking additional information with:
{commands}

Your response is very structured. The response will contain "THOUGHT: " and
"ACTION: " followed by the thought and action you are taking with the
commands. The action is very structured and will contain the command you
are executing and the argument to the command with the format:
{ "command": "calculate", "args": "7*77" } STOP_ACTION

When the command has been executed, the response will contain
"OBSERVATION: " followed by the output of the command. Use the output
to generate a new THOUGHT and ACTION. If you can find the answer in the
observation return "ANSWER: " followed by the answer. If no further
action is needed just write an answer based on the question and
previous observations.

Stop after ACTION or ANSWER. If there is no ACTION then end with
the ANSWER and put your conclusion in the ANSWER.

You MUST make at least one ACTION

Examples:

QUESTION: What is 7*77?
THOUGHT: I need to calculate the answer to the question.
ACTION: { "command": "calculate", "args": "7*77" } STOP_ACTION
OBSERVATION: 539
THOUGHT: I have the answer to the question.
ANSWER: 539

QUESTION: Who is the president of the United States?
THOUGHT: I need to find the president of the United States in the wikipedia.
ACTION: { "command": "wikisearch", "args": "United States" } STOP_ACTION
OBSERVATION: The United States have lots of content here. Joe Biden is the president of the United States. More content.
ANSWER: Joe Biden is the president of the United States.
"#;

const SUMMARIZE_TEMPLATE: &str = r#"You are very good in picking relevant information from a text.
The text might come from a command and be structured or unstructured.
You are given a text and a question. You must summarize the information in the text
which might be relevant to the question. If there is nothing interesting you must return
"EMPTY"."#;

/// The instructional templates driving a loop, passed in at construction
/// instead of read from global state. `main` must carry exactly one
/// `{commands}` placeholder.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub main: String,
    pub summarize: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            main: MAIN_TEMPLATE.to_string(),
            summarize: SUMMARIZE_TEMPLATE.to_string(),
        }
    }
}

/// Substitute the rendered command table into the template. Pure; two calls
/// with the same registry produce byte-identical output.
pub fn render(template: &str, registry: &CommandRegistry) -> String {
    template.replace(COMMANDS_PLACEHOLDER, &registry.render_table())
}
