//! Digest synthesis. A closed set of strategies turns the selected items and
//! their extraction results into one markdown document. Every strategy
//! returns text; failures become an italic notice inside the digest.

use std::collections::{BTreeMap, HashMap};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::entities::{Item, ItemStatus};
use crate::extractor::ExtractionResult;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_REMOTE_MODEL: &str = "gemini-2.0-flash";
/// Environment variable holding the bearer token for the remote adapter.
pub const ENV_REMOTE_API_KEY: &str = "GAZETTE_REMOTE_API_KEY";

const SUMMARY_MIN_CHARS: usize = 50;
const SUMMARY_MAX_CHARS: usize = 500;
const PROMPT_CONTENT_CHARS: usize = 1500;

static HEADING_MARKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisStrategy {
    /// Rule-based digest built from extracted text and snippets.
    Template,
    /// External program invoked as `program args... <prompt>`; stdout is the
    /// digest.
    Command {
        program: String,
        args: Vec<String>,
        timeout: Duration,
    },
    /// JSON completion endpoint taking `{model, prompt, stream}`.
    Remote {
        endpoint: String,
        model: String,
        api_key_env: String,
        timeout: Duration,
    },
}

#[derive(Error, Debug)]
enum SynthesisError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("response carried no text")]
    EmptyResponse,
}

impl SynthesisStrategy {
    /// Pick the strategy named by the configuration. Unknown names and a
    /// remote adapter without an endpoint fall back to the template.
    pub fn from_config(config: &Config) -> Self {
        match config.adapter() {
            "template" => Self::Template,
            "command" => {
                let mut parts = config.llm_command().split_whitespace().map(str::to_string);
                match parts.next() {
                    Some(program) => Self::Command {
                        program,
                        args: parts.collect(),
                        timeout: DEFAULT_COMMAND_TIMEOUT,
                    },
                    None => {
                        warn!("empty llm command, using template adapter");
                        Self::Template
                    }
                }
            }
            "remote" => match config.remote_endpoint() {
                Some(endpoint) => Self::Remote {
                    endpoint: endpoint.to_string(),
                    model: config
                        .remote_model()
                        .unwrap_or(DEFAULT_REMOTE_MODEL)
                        .to_string(),
                    api_key_env: ENV_REMOTE_API_KEY.to_string(),
                    timeout: DEFAULT_REMOTE_TIMEOUT,
                },
                None => {
                    warn!("remote adapter has no endpoint, using template adapter");
                    Self::Template
                }
            },
            other => {
                warn!(adapter = other, "unknown adapter, using template adapter");
                Self::Template
            }
        }
    }

    /// Name recorded in the run summary.
    pub fn name(&self) -> String {
        match self {
            Self::Template => "template".to_string(),
            Self::Command { program, .. } => format!("command:{program}"),
            Self::Remote { model, .. } => format!("remote:{model}"),
        }
    }

    #[instrument(skip_all, fields(adapter = %self.name(), items = items.len()))]
    pub async fn produce(&self, items: &[Item], articles: &[ExtractionResult]) -> String {
        match self {
            Self::Template => render_template(items, articles),
            Self::Command {
                program,
                args,
                timeout,
            } => {
                let prompt = build_prompt(items, articles);
                match run_command(program, args, &prompt, *timeout).await {
                    Ok(text) => text,
                    Err(e) => {
                        error!("command synthesis failed: {}", e);
                        format!("*Command synthesis failed: {e}*")
                    }
                }
            }
            Self::Remote {
                endpoint,
                model,
                api_key_env,
                timeout,
            } => {
                let prompt = build_prompt(items, articles);
                match call_remote(endpoint, model, api_key_env, &prompt, *timeout).await {
                    Ok(text) => text,
                    Err(e) => {
                        error!("remote synthesis failed: {}", e);
                        format!("*Remote synthesis failed: {e}*")
                    }
                }
            }
        }
    }
}

fn successful_articles(articles: &[ExtractionResult]) -> HashMap<&str, &ExtractionResult> {
    articles
        .iter()
        .filter(|a| a.success)
        .map(|a| (a.url.as_str(), a))
        .collect()
}

/// Group sections in name order; items keep their curated order inside a
/// group.
pub fn render_template(items: &[Item], articles: &[ExtractionResult]) -> String {
    let by_url = successful_articles(articles);
    let mut groups: BTreeMap<&str, Vec<&Item>> = BTreeMap::new();
    for item in items {
        groups.entry(item.group.as_str()).or_default().push(item);
    }

    let mut lines = Vec::new();
    for (group, group_items) in groups {
        lines.push(format!("## {}", display_group_name(group)));
        lines.push(String::new());

        for item in group_items {
            lines.push(format!("### [{}]({})", item.title, item.url));
            lines.push(format!("*Source: {}*", item.source));
            lines.push(String::new());

            match by_url.get(item.url.as_str()) {
                Some(article) if item.status != ItemStatus::ExtractFailed => {
                    lines.push(summary_paragraph(&article.text));
                }
                _ => {
                    lines.push(format!("> {}", item.snippet));
                    if item.status == ItemStatus::ExtractFailed {
                        lines.push(String::new());
                        lines.push("*Full content extraction failed*".to_string());
                    }
                }
            }
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

/// `"dev_tools"` becomes `"Dev Tools"`.
fn display_group_name(name: &str) -> String {
    name.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// First paragraph that looks like prose, truncated for the digest.
pub fn summary_paragraph(text: &str) -> String {
    let text = HEADING_MARKS.replace_all(text, "");
    let paragraph = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| p.chars().count() >= SUMMARY_MIN_CHARS)
        .find(|p| !p.starts_with(['*', '-', '|', '[']));
    truncate(paragraph.unwrap_or(text.trim()), SUMMARY_MAX_CHARS)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Instruction plus one section per item, with extracted text when available
/// and the snippet otherwise.
fn build_prompt(items: &[Item], articles: &[ExtractionResult]) -> String {
    let by_url = successful_articles(articles);
    let sections: Vec<String> = items
        .iter()
        .map(|item| {
            let content = match by_url.get(item.url.as_str()) {
                Some(article) => truncate(&article.text, PROMPT_CONTENT_CHARS),
                None => item.snippet.clone(),
            };
            format!(
                "### {}\nSource: {} | Category: {}\nURL: {}\n\n{}\n",
                item.title, item.source, item.group, item.url, content
            )
        })
        .collect();

    format!(
        "Write a concise markdown digest of the following {} articles. \
         Group them by category, give each a short summary with its link, \
         and do not invent facts.\n\n## Articles to analyze:\n\n{}",
        items.len(),
        sections.join("\n---\n")
    )
}

async fn run_command(
    program: &str,
    args: &[String],
    prompt: &str,
    timeout: Duration,
) -> Result<String, SynthesisError> {
    let child = Command::new(program)
        .args(args)
        .arg(prompt)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SynthesisError::NotFound(program.to_string()),
            _ => SynthesisError::Io(e),
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| SynthesisError::Timeout(timeout))??;

    if !output.status.success() {
        return Err(SynthesisError::Exit {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    info!(bytes = output.stdout.len(), "command synthesis complete");
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

async fn call_remote(
    endpoint: &str,
    model: &str,
    api_key_env: &str,
    prompt: &str,
    timeout: Duration,
) -> Result<String, SynthesisError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let mut request = client.post(endpoint).json(&CompletionRequest {
        model,
        prompt,
        stream: false,
    });
    if let Ok(key) = std::env::var(api_key_env)
        && !key.is_empty()
    {
        request = request.bearer_auth(key);
    }

    let body: serde_json::Value = request.send().await?.error_for_status()?.json().await?;
    let text = ["response", "text", "content"]
        .iter()
        .find_map(|key| body.get(key).and_then(|v| v.as_str()))
        .or_else(|| body.pointer("/choices/0/message/content").and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SynthesisError::EmptyResponse)?;
    info!(chars = text.len(), "remote synthesis complete");
    Ok(text.to_string())
}
