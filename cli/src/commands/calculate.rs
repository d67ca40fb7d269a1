//! Arithmetic evaluator: shunting-yard over `+ - * / % ^`, parentheses,
//! unary minus, a few single-argument functions, and the constants `pi`
//! and `e`.

use anyhow::{Result, bail};
use async_trait::async_trait;
use reagent_core::{Command, CommandResult};

pub struct CalculateCommand;

impl CalculateCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Command for CalculateCommand {
    fn name(&self) -> &str {
        "calculate"
    }

    fn argument_label(&self) -> &str {
        "expression"
    }

    fn description(&self) -> &str {
        "Calculate the answer to a math problem. The expression is like: 180*tan(ln(e))/pi"
    }

    async fn invoke(&self, argument: &str) -> Result<CommandResult> {
        match evaluate(argument) {
            Ok(value) => Ok(CommandResult::ok(format_number(value))),
            // An unparsable expression steers the oracle, it does not
            // abort the loop.
            Err(e) => Ok(CommandResult::fail_with_output(
                e.to_string(),
                format!("Could not evaluate '{argument}': {e}"),
            )),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    Neg,
    Func(String),
    LParen,
    RParen,
}

pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        bail!("empty expression");
    }
    eval_rpn(&to_rpn(tokens)?)
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value: f64 = literal
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid number: {literal}"))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_alphanumeric() {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                match name.as_str() {
                    "pi" => tokens.push(Token::Num(std::f64::consts::PI)),
                    "e" => tokens.push(Token::Num(std::f64::consts::E)),
                    _ => tokens.push(Token::Func(name)),
                }
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '-' if unary_position(tokens.last()) => {
                tokens.push(Token::Neg);
                i += 1;
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            _ => bail!("unexpected character: {c}"),
        }
    }
    Ok(tokens)
}

fn unary_position(previous: Option<&Token>) -> bool {
    !matches!(previous, Some(Token::Num(_)) | Some(Token::RParen))
}

fn precedence(token: &Token) -> u8 {
    match token {
        Token::Op('+') | Token::Op('-') => 1,
        Token::Op('*') | Token::Op('/') | Token::Op('%') => 2,
        Token::Op('^') => 3,
        Token::Neg => 4,
        Token::Func(_) => 5,
        _ => 0,
    }
}

fn right_associative(token: &Token) -> bool {
    matches!(token, Token::Op('^') | Token::Neg | Token::Func(_))
}

fn to_rpn(tokens: Vec<Token>) -> Result<Vec<Token>> {
    let mut output = Vec::new();
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Num(_) => output.push(token),
            Token::Func(_) | Token::Neg => stack.push(token),
            Token::Op(_) => {
                while let Some(top) = stack.last() {
                    let pops = precedence(top) > precedence(&token)
                        || (precedence(top) == precedence(&token) && !right_associative(&token));
                    if matches!(top, Token::LParen) || !pops {
                        break;
                    }
                    output.push(stack.pop().unwrap());
                }
                stack.push(token);
            }
            Token::LParen => stack.push(token),
            Token::RParen => {
                loop {
                    match stack.pop() {
                        Some(Token::LParen) => break,
                        Some(inner) => output.push(inner),
                        None => bail!("unbalanced parentheses"),
                    }
                }
                if matches!(stack.last(), Some(Token::Func(_))) {
                    output.push(stack.pop().unwrap());
                }
            }
        }
    }

    while let Some(token) = stack.pop() {
        if matches!(token, Token::LParen) {
            bail!("unbalanced parentheses");
        }
        output.push(token);
    }
    Ok(output)
}

fn eval_rpn(rpn: &[Token]) -> Result<f64> {
    let mut stack: Vec<f64> = Vec::new();

    for token in rpn {
        match token {
            Token::Num(value) => stack.push(*value),
            Token::Neg => {
                let value = stack.pop().ok_or_else(|| anyhow::anyhow!("missing operand"))?;
                stack.push(-value);
            }
            Token::Op(op) => {
                let b = stack.pop().ok_or_else(|| anyhow::anyhow!("missing operand"))?;
                let a = stack.pop().ok_or_else(|| anyhow::anyhow!("missing operand"))?;
                let value = match *op {
                    '+' => a + b,
                    '-' => a - b,
                    '*' => a * b,
                    '/' => {
                        if b == 0.0 {
                            bail!("division by zero");
                        }
                        a / b
                    }
                    '%' => a % b,
                    '^' => a.powf(b),
                    _ => bail!("unknown operator: {op}"),
                };
                stack.push(value);
            }
            Token::Func(name) => {
                let value = stack.pop().ok_or_else(|| anyhow::anyhow!("missing operand"))?;
                let result = match name.as_str() {
                    "sqrt" => value.sqrt(),
                    "sin" => value.sin(),
                    "cos" => value.cos(),
                    "tan" => value.tan(),
                    "atan" => value.atan(),
                    "ln" => value.ln(),
                    "log" => value.log10(),
                    "log10" => value.log10(),
                    "exp" => value.exp(),
                    "abs" => value.abs(),
                    "floor" => value.floor(),
                    "ceil" => value.ceil(),
                    _ => bail!("unknown function: {name}"),
                };
                stack.push(result);
            }
            Token::LParen | Token::RParen => bail!("unbalanced parentheses"),
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(value), true) => Ok(value),
        _ => bail!("malformed expression"),
    }
}
