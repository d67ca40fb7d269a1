//! Recursive summarization of oversized tool output.
//!
//! A fixed-size window slides over the text; each chunk is summarized by
//! the oracle with respect to the question, and the chunk summaries are
//! concatenated. The pass repeats on its own output until the result fits
//! the budget, which keeps transcript growth bounded independent of tool
//! output size (a scraped web page of arbitrary length costs a handful of
//! extra oracle calls, not thousands of transcript tokens).

use crate::agent::prompt::EMPTY_SENTINEL;
use crate::providers::RetryPolicy;
use crate::traits::{Oracle, OracleError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CHUNK_SIZE: usize = 2048;
pub const DEFAULT_OVERLAP: usize = 32;

/// Hard ceiling on recursive passes; the non-convergence guard normally
/// fires long before this.
const MAX_PASSES: usize = 8;

/// A compressed observation must never silently vanish from the transcript.
const EMPTY_FALLBACK: &str = "Nothing interesting found";

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("summarization request failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("chunk overlap must be smaller than chunk size")]
    BadWindow,
}

pub struct Compressor {
    oracle: Arc<dyn Oracle>,
    directive: String,
    chunk_size: usize,
    overlap: usize,
    retry: RetryPolicy,
}

impl Compressor {
    pub fn new(oracle: Arc<dyn Oracle>, directive: impl Into<String>) -> Self {
        Self {
            oracle,
            directive: directive.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_window(mut self, chunk_size: usize, overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.overlap = overlap;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reduce `text` to at most `budget` characters. Identity when the text
    /// already fits. `focus` is the most recent reasoning line, if any,
    /// narrowing what counts as relevant.
    pub async fn shrink(
        &self,
        question: &str,
        focus: Option<&str>,
        text: &str,
        budget: usize,
    ) -> Result<String, CompressError> {
        if text.chars().count() <= budget {
            // A blank observation must still leave a trace in the transcript.
            if text.trim().is_empty() {
                return Ok(EMPTY_FALLBACK.to_string());
            }
            return Ok(text.to_string());
        }
        if self.overlap >= self.chunk_size {
            return Err(CompressError::BadWindow);
        }

        let topic = match focus {
            Some(focus) => format!("{question} {focus}"),
            None => question.to_string(),
        };

        let mut current = text.to_string();
        for pass in 0..MAX_PASSES {
            let before = current.chars().count();
            let combined = self.window_pass(&topic, &current).await?;
            let after = combined.chars().count();
            debug!(pass, before, after, "compression pass");

            if after >= before {
                // The windowed pass stopped making progress; one direct
                // summarization over the whole text, then stop.
                current = self
                    .retry
                    .request(
                        &*self.oracle,
                        "Summarize in 3 sentences according to the question.",
                        &format!(
                            "Question: {question}\nHere is the text to summarize in 3 sentences:\n{combined}\n"
                        ),
                    )
                    .await?;
                break;
            }

            current = combined;
            if current.chars().count() <= budget {
                break;
            }
        }

        let current = current.trim().to_string();
        if current.is_empty() {
            Ok(EMPTY_FALLBACK.to_string())
        } else {
            Ok(current)
        }
    }

    /// One sliding-window pass: summarize each chunk, concatenate, strip
    /// the "nothing relevant" sentinel.
    async fn window_pass(&self, topic: &str, text: &str) -> Result<String, CompressError> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;

        let mut from = 0;
        let mut combined = String::new();
        loop {
            let to = (from + self.chunk_size).min(chars.len());
            let part: String = chars[from..to].iter().collect();

            let summary = self
                .retry
                .request(
                    &*self.oracle,
                    &self.directive,
                    &format!(
                        "Question: {topic}\nHere is the text to summarize in two sentences:\n{part}\n"
                    ),
                )
                .await?;
            combined.push_str(&summary.replace(EMPTY_SENTINEL, ""));

            from += step;
            if from + self.overlap >= chars.len() {
                break;
            }
        }

        Ok(combined.trim_matches('\n').to_string())
    }
}
