//! Sentiment scoring collaborator.
//!
//! Text classification is deliberately opaque here: the pipeline only needs
//! "given text, return a scalar in roughly [-1, 1]". The production
//! implementation shells out to whatever external scorer is configured,
//! exchanging a single JSON object in each direction, the same contract the
//! surrounding process speaks on its own stdin/stdout.

use anyhow::{bail, Context, Result};
use log::debug;
use serde::Deserialize;
use std::io::Write;
use std::process::{Command, Stdio};

/// Scalar sentiment in approximately [-1, 1] for free text.
pub trait SentimentScorer {
    fn score(&self, text: &str) -> Result<f64>;
}

/// Output contract of the external scorer.
#[derive(Debug, Deserialize)]
struct ScoreOutput {
    sentiment_score: f64,
}

/// Spawns an external scoring command per request.
///
/// Writes `{"text": ...}` to the child's stdin and expects
/// `{"sentiment_score": ...}` on its stdout. Non-zero exit status or
/// malformed output is a request error, not a silent neutral.
#[derive(Debug, Clone)]
pub struct CommandScorer {
    command: Vec<String>,
}

impl CommandScorer {
    /// Build from a whitespace-separated command line, e.g.
    /// `python3 sentiment.py`.
    pub fn new(command_line: &str) -> Result<Self> {
        let command: Vec<String> = command_line.split_whitespace().map(str::to_owned).collect();
        if command.is_empty() {
            bail!("sentiment command is empty");
        }
        Ok(Self { command })
    }
}

impl SentimentScorer for CommandScorer {
    fn score(&self, text: &str) -> Result<f64> {
        let payload = serde_json::json!({ "text": text }).to_string();
        debug!("Invoking sentiment command `{}`", self.command[0]);

        let mut child = Command::new(&self.command[0])
            .args(&self.command[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn sentiment command `{}`", self.command[0]))?;

        child
            .stdin
            .as_mut()
            .context("Sentiment command has no stdin")?
            .write_all(payload.as_bytes())
            .context("Failed to write request to sentiment command")?;

        let output = child
            .wait_with_output()
            .context("Sentiment command did not finish")?;
        if !output.status.success() {
            bail!(
                "sentiment command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let parsed: ScoreOutput = serde_json::from_slice(&output.stdout)
            .context("Sentiment command produced invalid JSON")?;
        debug!("Sentiment score {:.4}", parsed.sentiment_score);
        Ok(parsed.sentiment_score)
    }
}

/// Fixed score, for tests and offline runs (`--score`).
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer(pub f64);

impl SentimentScorer for FixedScorer {
    fn score(&self, _text: &str) -> Result<f64> {
        Ok(self.0)
    }
}
