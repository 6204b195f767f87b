use super::AnalysisEngine;
use crate::error::EngineError;
use crate::model::{AnalysisReport, Finding, Severity};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const PATH_PLACEHOLDER: &str = "{path}";

/// External linter invocation. `{path}` in any argument is replaced by the
/// analyzed file's path; the file content is always fed on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// First word is the program, the rest are arguments.
    pub fn from_words(mut words: Vec<String>) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        let program = words.remove(0);
        Some(Self::new(program, words))
    }

    pub fn eslint() -> Self {
        Self::new(
            "eslint",
            ["--format", "json", "--stdin", "--stdin-filename", PATH_PLACEHOLDER]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    fn args_for(&self, path: &Path) -> Vec<String> {
        let path = path.display().to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
            .collect()
    }
}

impl Default for EngineCommand {
    fn default() -> Self {
        Self::eslint()
    }
}

/// Runs one linter process per file and reads its ESLint-style JSON report.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    command: EngineCommand,
}

impl CommandEngine {
    pub fn new(command: EngineCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl AnalysisEngine for CommandEngine {
    async fn analyze(&self, path: &Path, content: &str) -> Result<AnalysisReport, EngineError> {
        let mut child = Command::new(&self.command.program)
            .args(self.command.args_for(path))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        // Feed stdin while draining stdout so a large report cannot deadlock the pipe.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(content.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        if let Err(e) = fed {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(EngineError::Io(e));
            }
        }

        // ESLint exits 1 when it found problems; that is still a report.
        match output.status.code() {
            Some(0) | Some(1) => Ok(parse_eslint_report(&output.stdout)?),
            _ => Err(EngineError::Exited {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct EslintResult {
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintMessage {
    #[serde(default)]
    severity: u8,
    #[serde(default)]
    fatal: bool,
    #[serde(default)]
    line: u32,
    #[serde(default)]
    column: u32,
    message: String,
    #[serde(default)]
    rule_id: Option<String>,
}

/// Parse ESLint's `--format json` output. Severity 2 (or `fatal`) is an
/// error, 1 a warning; counts are recomputed from the messages.
pub fn parse_eslint_report(stdout: &[u8]) -> Result<AnalysisReport, serde_json::Error> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnalysisReport::default());
    }

    let results: Vec<EslintResult> = serde_json::from_slice(stdout)?;
    let findings = results
        .into_iter()
        .flat_map(|r| r.messages)
        .filter_map(|m| {
            let severity = match (m.fatal, m.severity) {
                (true, _) | (_, 2..) => Severity::Error,
                (false, 1) => Severity::Warning,
                _ => return None,
            };
            Some(Finding {
                severity,
                line: m.line,
                column: m.column,
                message: m.message,
                rule: m.rule_id,
            })
        })
        .collect();

    Ok(AnalysisReport::from_findings(findings))
}
