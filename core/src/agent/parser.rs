//! Extracts `(command, argument)` from a line of oracle output.
//!
//! Two surface syntaxes are accepted. The structured form is a single-line
//! JSON-like literal:
//!
//! ```text
//! { "command": "calculate", "args": "7*77" } STOP_ACTION
//! ```
//!
//! The compact form is `<command> <argument...>`, the required fallback
//! because oracles frequently ignore the structured format. An unrecognized
//! command name is never a parse error; that is resolved one layer up as a
//! steering observation.

use crate::agent::prompt::STOP_ACTION;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty action line")]
    Empty,
    #[error("malformed structured action: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub command: String,
    pub argument: String,
}

/// Which grammar matched. The loop only needs the action; tests exercise
/// the variants independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAction {
    Structured(Action),
    Compact(Action),
}

impl ParsedAction {
    pub fn into_action(self) -> Action {
        match self {
            ParsedAction::Structured(action) | ParsedAction::Compact(action) => action,
        }
    }
}

pub fn parse_action(input: &str) -> Result<ParsedAction, ParseError> {
    // Only the first line carries the action; a trailing stop marker may
    // survive when the provider did not honor its stop sequences.
    let line = input.lines().next().unwrap_or("").trim();
    let line = line.strip_suffix(STOP_ACTION).unwrap_or(line).trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    if line.contains('{') {
        return parse_structured(line).map(ParsedAction::Structured);
    }
    Ok(ParsedAction::Compact(parse_compact(line)))
}

fn parse_structured(line: &str) -> Result<Action, ParseError> {
    let block = braced_block(line)
        .ok_or_else(|| ParseError::Malformed(format!("unterminated brace in: {line}")))?;

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(block) {
        return action_from_json(&value)
            .ok_or_else(|| ParseError::Malformed(format!("missing command or args in: {block}")));
    }
    action_from_fields(block)
}

/// First balanced `{...}` block, string- and escape-aware.
fn braced_block(line: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in line.char_indices() {
        match ch {
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(&line[s..=i]);
                    }
                }
            }
            '"' if !escape_next => {
                in_string = !in_string;
            }
            '\\' if in_string => {
                escape_next = true;
                continue;
            }
            _ => {}
        }
        escape_next = false;
    }
    None
}

fn action_from_json(value: &serde_json::Value) -> Option<Action> {
    let command = value.get("command")?.as_str()?.to_string();
    let args = value.get("args").or_else(|| value.get("argument"))?;
    let argument = match args.as_str() {
        Some(s) => s.to_string(),
        // Non-string arguments are passed through verbatim.
        None => args.to_string(),
    };
    Some(Action { command, argument })
}

/// Tolerant fallback for structured lines that are not valid JSON, e.g.
/// unquoted values. Splits into two `key: value` fields; everything after
/// the second field's first colon belongs to the argument.
fn action_from_fields(block: &str) -> Result<Action, ParseError> {
    let inner = block.trim_matches(|c| c == '{' || c == '}').trim();
    let (command_field, argument_field) = inner
        .split_once(',')
        .ok_or_else(|| ParseError::Malformed(format!("expected two fields in: {block}")))?;

    let command = field_value(command_field)
        .ok_or_else(|| ParseError::Malformed(format!("no command value in: {block}")))?;
    let argument = field_value(argument_field)
        .ok_or_else(|| ParseError::Malformed(format!("no argument value in: {block}")))?;

    Ok(Action { command, argument })
}

fn field_value(field: &str) -> Option<String> {
    let (_, value) = field.split_once(':')?;
    Some(strip_quotes(value.trim()).to_string())
}

fn parse_compact(line: &str) -> Action {
    match line.split_once(' ') {
        Some((command, rest)) => Action {
            command: command.to_string(),
            argument: strip_quotes(rest.trim()).to_string(),
        },
        // A command taking no parameter is legal.
        None => Action {
            command: line.to_string(),
            argument: String::new(),
        },
    }
}

/// Strip exactly one layer of surrounding double quotes.
fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(command: &str, argument: &str) -> Action {
        Action {
            command: command.to_string(),
            argument: argument.to_string(),
        }
    }

    #[test]
    fn structured_json_action() {
        let parsed = parse_action(r#"{ "command": "calculate", "args": "7*77" } STOP_ACTION"#);
        assert_eq!(
            parsed,
            Ok(ParsedAction::Structured(action("calculate", "7*77")))
        );
    }

    #[test]
    fn structured_round_trip() {
        let original = action("wikisearch", "United States");
        let rendered = format!(
            r#"{{ "command": "{}", "args": "{}" }} STOP_ACTION"#,
            original.command, original.argument
        );
        assert_eq!(
            parse_action(&rendered).unwrap().into_action(),
            original
        );
    }

    #[test]
    fn structured_argument_keeps_separators() {
        let parsed =
            parse_action(r#"{ "command": "calculate", "args": "atan2(1, 2): the ratio" }"#);
        assert_eq!(
            parsed.unwrap().into_action(),
            action("calculate", "atan2(1, 2): the ratio")
        );
    }

    #[test]
    fn structured_accepts_argument_key() {
        let parsed = parse_action(r#"{ "command": "answer", "argument": "42" }"#);
        assert_eq!(parsed.unwrap().into_action(), action("answer", "42"));
    }

    #[test]
    fn structured_unquoted_values_fall_back_to_field_split() {
        let parsed = parse_action("{ command: calculate, args: 7*77 }");
        assert_eq!(
            parsed,
            Ok(ParsedAction::Structured(action("calculate", "7*77")))
        );
    }

    #[test]
    fn structured_field_split_keeps_colons_in_argument() {
        let parsed = parse_action("{ command: lookup, args: https://example.com:8080/x }");
        assert_eq!(
            parsed.unwrap().into_action(),
            action("lookup", "https://example.com:8080/x")
        );
    }

    #[test]
    fn structured_with_single_field_is_malformed() {
        assert!(matches!(
            parse_action(r#"{ "command": "calculate" }"#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn unterminated_brace_is_malformed() {
        assert!(matches!(
            parse_action(r#"{ "command": "calculate", "args": "7""#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn compact_round_trip() {
        let original = action("wikisearch", "United States");
        let rendered = format!("{} {}", original.command, original.argument);
        assert_eq!(
            parse_action(&rendered),
            Ok(ParsedAction::Compact(original))
        );
    }

    #[test]
    fn compact_strips_one_quote_layer() {
        let parsed = parse_action(r#"calculate "7*77""#);
        assert_eq!(parsed.unwrap().into_action(), action("calculate", "7*77"));
    }

    #[test]
    fn compact_without_argument() {
        let parsed = parse_action("look");
        assert_eq!(parsed, Ok(ParsedAction::Compact(action("look", ""))));
    }

    #[test]
    fn only_first_line_is_considered() {
        let parsed = parse_action("calculate 7*77\nOBSERVATION: ignored");
        assert_eq!(parsed.unwrap().into_action(), action("calculate", "7*77"));
    }

    #[test]
    fn empty_line_is_an_error() {
        assert_eq!(parse_action("   "), Err(ParseError::Empty));
    }

    #[test]
    fn quoted_braces_inside_argument_survive() {
        let parsed = parse_action(r#"{ "command": "echo", "args": "a { b } c" }"#);
        assert_eq!(parsed.unwrap().into_action(), action("echo", "a { b } c"));
    }
}
