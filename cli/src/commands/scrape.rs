use anyhow::Result;
use async_trait::async_trait;
use reagent_core::{Command, CommandResult};

/// Fetches a web page and reduces its HTML to readable text.
///
/// Pages routinely exceed the observation budget, so the scraped text
/// is handed back whole and left for the context compressor to shrink.
pub struct ScrapeCommand {
    client: reqwest::Client,
}

impl ScrapeCommand {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("reagent")
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

#[async_trait]
impl Command for ScrapeCommand {
    fn name(&self) -> &str {
        "scrape"
    }

    fn argument_label(&self) -> &str {
        "http address"
    }

    fn description(&self) -> &str {
        "Scrape reads the content of a web page given by the http address"
    }

    async fn invoke(&self, argument: &str) -> Result<CommandResult> {
        let address = argument.trim();
        if address.is_empty() {
            return Ok(CommandResult::fail_with_output(
                "empty address",
                "No address given. Provide an http address to scrape.",
            ));
        }

        // An unreachable page is informative to the oracle; keep the
        // loop alive and report what went wrong.
        let response = match self.client.get(address).send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(CommandResult::fail_with_output(
                    e.to_string(),
                    format!("Could not fetch {address}: {e}"),
                ));
            }
        };

        if !response.status().is_success() {
            return Ok(CommandResult::fail_with_output(
                format!("status {}", response.status()),
                format!("Fetching {address} failed with status {}", response.status()),
            ));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Ok(CommandResult::fail_with_output(
                    e.to_string(),
                    format!("Could not read the body of {address}: {e}"),
                ));
            }
        };

        let text = html_to_text(&body);
        if text.is_empty() {
            return Ok(CommandResult::fail_with_output(
                "no text",
                format!("The page at {address} contained no readable text"),
            ));
        }

        Ok(CommandResult::ok(text))
    }
}

/// Strips markup down to the visible text, dropping script and style
/// bodies and collapsing runs of whitespace.
fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut chars = html.char_indices().peekable();
    let mut skip_until: Option<&str> = None;

    while let Some((i, c)) = chars.next() {
        if c != '<' {
            if skip_until.is_none() {
                out.push(c);
            }
            continue;
        }

        let rest = &html[i..];
        let end = match rest.find('>') {
            Some(end) => end,
            // Unterminated tag, nothing visible follows.
            None => break,
        };
        let tag = &rest[1..end];

        if let Some(closer) = skip_until {
            if tag_name(tag).eq_ignore_ascii_case(closer.trim_start_matches('/'))
                && tag.starts_with('/')
            {
                skip_until = None;
            }
        } else {
            match tag_name(tag).to_ascii_lowercase().as_str() {
                "script" => skip_until = Some("/script"),
                "style" => skip_until = Some("/style"),
                // Block-level boundaries become line breaks so words
                // from adjacent elements never run together.
                "p" | "/p" | "br" | "br/" | "div" | "/div" | "li" | "/li" | "tr" | "/tr"
                | "h1" | "/h1" | "h2" | "/h2" | "h3" | "/h3" | "h4" | "/h4" | "h5" | "/h5"
                | "h6" | "/h6" => out.push('\n'),
                _ => out.push(' '),
            }
        }

        while let Some(&(j, _)) = chars.peek() {
            if j <= i + end {
                chars.next();
            } else {
                break;
            }
        }
    }

    let decoded = decode_entities(&out);
    collapse_whitespace(&decoded)
}

fn tag_name(tag: &str) -> &str {
    let tag = tag.trim_start_matches('/');
    tag.split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or("")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped_to_text() {
        let html = "<html><body><h1>Title</h1><p>First &amp; second.</p></body></html>";
        assert_eq!(html_to_text(html), "Title\nFirst & second.");
    }

    #[test]
    fn script_and_style_bodies_are_dropped() {
        let html = "<style>p { color: red; }</style><script>var x = 1;</script><p>Kept</p>";
        assert_eq!(html_to_text(html), "Kept");
    }

    #[test]
    fn whitespace_runs_collapse() {
        let html = "<div>one   \t two</div>\n\n<div>three</div>";
        assert_eq!(html_to_text(html), "one two\nthree");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(html_to_text("a &lt;b&gt; &quot;c&quot; &#39;d&#39;"), "a <b> \"c\" 'd'");
    }

    #[tokio::test]
    async fn empty_address_is_informative_failure() {
        let command = ScrapeCommand::new();
        let result = command.invoke("  ").await.unwrap();
        assert!(result.is_failure());
        assert!(result.output.contains("No address given"));
    }

    #[tokio::test]
    async fn unreachable_page_is_informative_not_fatal() {
        let command = ScrapeCommand::new();
        let result = command.invoke("http://127.0.0.1:9/none").await.unwrap();
        assert!(result.is_failure());
        assert!(result.output.contains("Could not fetch http://127.0.0.1:9/none"));
    }
}
