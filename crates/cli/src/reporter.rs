use lintwatch_core::error::LintwatchError;
use lintwatch_core::model::{BatchResult, FailureKind, FileReport, Finding, Severity};
use lintwatch_core::report::Reporter;
use nu_ansi_term::{Color, Style};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Human-facing output on stdout.
pub struct TerminalReporter {
    root: PathBuf,
    show_warnings: bool,
}

impl TerminalReporter {
    pub fn new(root: PathBuf, show_warnings: bool) -> Self {
        Self {
            root,
            show_warnings,
        }
    }

    fn display_path<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }

    fn visible<'a>(&self, file: &'a FileReport) -> Vec<&'a Finding> {
        file.findings()
            .iter()
            .filter(|f| self.show_warnings || f.severity == Severity::Error)
            .collect()
    }

    fn render(&self, result: &BatchResult) -> String {
        let mut out = String::new();

        for file in &result.files {
            let findings = self.visible(file);
            if findings.is_empty() && file.failure().is_none() {
                continue;
            }

            out.push('\n');
            let header = self.display_path(&file.path).to_string();
            out.push_str(&Style::new().bold().underline().paint(header).to_string());
            out.push('\n');

            if let Some(failure) = file.failure() {
                let what = match failure.kind {
                    FailureKind::Read => "could not read",
                    FailureKind::Analysis => "could not analyze",
                };
                out.push_str(&format!(
                    "{} {}: {}\n",
                    Color::Magenta.paint("?"),
                    what,
                    failure.message
                ));
            }

            for finding in findings {
                let marker = match finding.severity {
                    Severity::Error => Color::Red.paint("✖ :"),
                    Severity::Warning => Color::Yellow.paint("⚠ :"),
                };
                let rule = finding
                    .rule
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "{} [line: {}, column: {}] {}{}\n",
                    marker, finding.line, finding.column, finding.message, rule
                ));
            }
        }

        out.push('\n');
        let failed = result.failed_files().count();
        if result.has_blocking_findings || failed > 0 {
            let blocking = result.files.iter().filter(|f| f.is_blocking()).count();
            let mut summary = format!(
                "✖ {} errors in {} files",
                result.error_count(),
                blocking
            );
            if failed > 0 {
                summary.push_str(&format!(", {failed} files could not be analyzed"));
            }
            out.push_str(&Color::Red.bold().paint(summary).to_string());
        } else {
            out.push_str(&Color::Green.paint("✔ No linting errors").to_string());
        }
        out.push('\n');

        if let Some(warning) = &result.cache_warning {
            out.push_str(&Color::Yellow.paint(format!("Cache not saved: {warning}")).to_string());
            out.push('\n');
        }

        out
    }
}

impl Reporter for TerminalReporter {
    fn batch_started(&self, trigger: &[PathBuf]) {
        if trigger.is_empty() {
            return;
        }
        println!();
        println!("========================================================");
        println!("{}", Color::Blue.bold().paint("File change. Linting files ..."));
    }

    fn batch_finished(&self, result: &BatchResult) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(self.render(result).as_bytes());
        let _ = stdout.flush();
    }

    fn batch_failed(&self, error: &LintwatchError) {
        eprintln!("{} {}", Color::Red.bold().paint("Lint run failed:"), error);
    }
}
