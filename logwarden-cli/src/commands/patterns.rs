//! `logwarden patterns` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use logwarden_analyzer::PatternSet;
use logwarden_core::config::LogwardenConfig;

use crate::cli::{PatternsAction, PatternsArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Label used when the built-in pattern set is active.
const BUILT_IN: &str = "built-in";

/// Execute the `patterns` command.
pub async fn execute(
    args: PatternsArgs,
    config: &LogwardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        PatternsAction::List { file } => {
            let report = list(file, config).await?;
            writer.render(&report)
        }
        PatternsAction::Validate { path } => {
            let report = validate(&path).await;
            writer.render(&report)?;
            if !report.valid {
                return Err(CliError::Pattern(format!(
                    "{} is invalid",
                    report.path
                )));
            }
            Ok(())
        }
    }
}

/// Loads the pattern set that an analysis would use.
///
/// Precedence: explicit file, then `[analyzer].patterns_file`, then the built-in set.
pub async fn list(
    file: Option<PathBuf>,
    config: &LogwardenConfig,
) -> Result<PatternListReport, CliError> {
    let path = file.or_else(|| config.analyzer.patterns_file.as_ref().map(PathBuf::from));

    let (source, set) = match path {
        Some(path) => {
            info!(path = %path.display(), "loading pattern file");
            let set = PatternSet::load_file(&path).await?;
            (path.display().to_string(), set)
        }
        None => (BUILT_IN.to_owned(), PatternSet::default()),
    };

    Ok(PatternListReport {
        source,
        total: set.len(),
        patterns: set
            .patterns()
            .iter()
            .map(|p| PatternEntry {
                name: p.name().to_owned(),
                pattern: p.as_str().to_owned(),
                description: p.description().to_owned(),
            })
            .collect(),
    })
}

/// Loads a pattern file and reports whether every pattern compiles.
pub async fn validate(path: &Path) -> PatternValidationReport {
    info!(path = %path.display(), "validating pattern file");

    match PatternSet::load_file(path).await {
        Ok(set) => PatternValidationReport {
            path: path.display().to_string(),
            valid: true,
            patterns: set.len(),
            errors: Vec::new(),
        },
        Err(e) => PatternValidationReport {
            path: path.display().to_string(),
            valid: false,
            patterns: 0,
            errors: vec![e.to_string()],
        },
    }
}

#[derive(Serialize)]
pub struct PatternListReport {
    pub source: String,
    pub total: usize,
    pub patterns: Vec<PatternEntry>,
}

#[derive(Serialize)]
pub struct PatternEntry {
    pub name: String,
    pub pattern: String,
    pub description: String,
}

impl Render for PatternListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Suspicious Patterns ({} total, source: {})",
            self.total.to_string().bold(),
            self.source
        )?;
        writeln!(w)?;
        writeln!(w, "{:<4} {:<26} Description", "#", "Name")?;
        writeln!(w, "{}", "-".repeat(72))?;

        for (i, p) in self.patterns.iter().enumerate() {
            writeln!(w, "{:<4} {:<26} {}", i + 1, p.name, p.description)?;
            writeln!(w, "     {}", p.pattern.dimmed())?;
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct PatternValidationReport {
    pub path: String,
    pub valid: bool,
    pub patterns: usize,
    pub errors: Vec<String>,
}

impl Render for PatternValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Pattern Validation: {}", self.path.bold())?;
        if self.valid {
            writeln!(
                w,
                "  Result: {} ({} patterns)",
                "VALID".green().bold(),
                self.patterns
            )?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(payload: &impl Render) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        payload
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[tokio::test]
    async fn test_list_defaults_to_built_in_set() {
        let report = list(None, &LogwardenConfig::default())
            .await
            .expect("built-in set should list");
        assert_eq!(report.source, BUILT_IN);
        assert_eq!(report.total, report.patterns.len());
        assert_eq!(report.patterns[0].name, "sql_injection");

        let output = render(&report);
        assert!(output.contains("Suspicious Patterns"));
        assert!(output.contains("path_traversal"));
    }

    #[tokio::test]
    async fn test_list_uses_configured_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("p.yml");
        tokio::fs::write(&path, "- name: admin_probe\n  pattern: \"^/admin\"\n")
            .await
            .expect("write patterns");

        let mut config = LogwardenConfig::default();
        config.analyzer.patterns_file = Some(path.display().to_string());

        let report = list(None, &config).await.expect("configured file should list");
        assert_eq!(report.total, 1);
        assert_eq!(report.patterns[0].name, "admin_probe");
        assert_eq!(report.source, path.display().to_string());
    }

    #[tokio::test]
    async fn test_validate_reports_invalid_regex() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bad.yml");
        tokio::fs::write(&path, "- name: broken\n  pattern: \"(unclosed\"\n")
            .await
            .expect("write patterns");

        let report = validate(&path).await;
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(render(&report).contains("INVALID"));
    }

    #[tokio::test]
    async fn test_validate_missing_file_is_invalid() {
        let report = validate(Path::new("/nonexistent/patterns.yml")).await;
        assert!(!report.valid);
        assert_eq!(report.patterns, 0);
    }

    #[test]
    fn test_validation_report_json() {
        let report = PatternValidationReport {
            path: "p.yml".to_owned(),
            valid: true,
            patterns: 4,
            errors: Vec::new(),
        };
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["valid"], true);
        assert_eq!(value["patterns"], 4);
    }
}
