//! Output formatting abstraction for text vs JSON rendering
//!
//! All subcommand output flows through [`OutputWriter`] which handles format switching.
//! This keeps format-specific logic out of command handlers entirely.

use std::io::Write;

use serde::Serialize;

use logwarden_analyzer::{Alert, AlertType, AnalysisReport};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Number of most recent alerts shown after a run.
pub const RECENT_ALERTS: usize = 20;

/// Abstraction for writing CLI output in different formats.
///
/// Subcommand handlers call `writer.render(&payload)` where `payload`
/// implements both `Serialize` (for JSON) and `Render` (for text).
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new output writer with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Render a payload to an arbitrary writer.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Trait for human-readable text rendering.
///
/// Implemented by every CLI output payload alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Result of an `analyze` or `monitor` run.
#[derive(Serialize)]
pub struct AnalysisOutput {
    /// Analyzed file
    pub source: String,
    /// Final report
    pub report: AnalysisReport,
    /// Most recent alerts, oldest first
    pub recent_alerts: Vec<Alert>,
    /// Why a monitor run ended (monitor only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Where the structured document was written, if requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_to: Option<String>,
}

impl AnalysisOutput {
    /// Keeps the last [`RECENT_ALERTS`] of `alerts`.
    pub fn new(source: String, report: AnalysisReport, alerts: &[Alert]) -> Self {
        let start = alerts.len().saturating_sub(RECENT_ALERTS);
        Self {
            source,
            report,
            recent_alerts: alerts[start..].to_vec(),
            stop_reason: None,
            exported_to: None,
        }
    }
}

impl Render for AnalysisOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Source: {}", self.source.bold())?;
        self.report.write_text(w)?;

        if !self.recent_alerts.is_empty() {
            writeln!(w)?;
            writeln!(w, "Recent alerts:")?;
            for alert in &self.recent_alerts {
                let label = match alert.alert_type {
                    AlertType::IpBlacklisted | AlertType::HighAlertRate => {
                        alert.alert_type.as_str().red().bold()
                    }
                    AlertType::SuspiciousRequest => alert.alert_type.as_str().yellow(),
                    AlertType::ApplicationError => alert.alert_type.as_str().red(),
                };
                let line = alert
                    .line_number
                    .map(|n| format!("line {n}"))
                    .unwrap_or_default();
                writeln!(
                    w,
                    "  {} {:<18} {:<10} {}",
                    alert.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
                    label,
                    line,
                    alert.message
                )?;
            }
        }

        if let Some(reason) = &self.stop_reason {
            writeln!(w)?;
            writeln!(w, "Monitor stopped: {reason}")?;
        }
        if let Some(path) = &self.exported_to {
            writeln!(w, "Exported: {}", path.green())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_analyzer::AnalysisSessionBuilder;

    const SUSPICIOUS: &str =
        r#"10.0.0.7 - - [10/Oct/2023:13:55:36 +0000] "GET /a/../../etc/passwd HTTP/1.1" 404 0"#;

    fn sample_output() -> AnalysisOutput {
        let mut session = AnalysisSessionBuilder::new().build().expect("session");
        session.process_line(SUSPICIOUS, Some(1));
        AnalysisOutput::new(
            "access.log".to_owned(),
            session.report(),
            session.alerts(),
        )
    }

    #[test]
    fn test_analysis_output_text_contains_report_and_alerts() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        OutputWriter::new(OutputFormat::Text)
            .render_to(&sample_output(), &mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Source: access.log"));
        assert!(output.contains("Log Analysis Report (apache)"));
        assert!(output.contains("Recent alerts:"));
        assert!(output.contains("suspicious_request"));
        assert!(output.contains("line 1"));
        assert!(!output.contains("Monitor stopped"));
    }

    #[test]
    fn test_analysis_output_json_structure() {
        let mut output = sample_output();
        output.exported_to = Some("out.json".to_owned());

        let mut buffer = Vec::new();
        OutputWriter::new(OutputFormat::Json)
            .render_to(&output, &mut buffer)
            .expect("json rendering should succeed");

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).expect("valid JSON");
        assert_eq!(parsed["source"], "access.log");
        assert_eq!(parsed["report"]["total_records"], 1);
        assert_eq!(parsed["recent_alerts"][0]["type"], "SuspiciousRequest");
        assert_eq!(parsed["exported_to"], "out.json");
        assert!(parsed.get("stop_reason").is_none());
    }

    #[test]
    fn test_recent_alerts_keeps_the_tail() {
        let mut session = AnalysisSessionBuilder::new().build().expect("session");
        for n in 1..=(RECENT_ALERTS as u64 + 5) {
            session.process_line(SUSPICIOUS, Some(n));
        }
        let output = AnalysisOutput::new("a".to_owned(), session.report(), session.alerts());
        assert_eq!(output.recent_alerts.len(), RECENT_ALERTS);
        assert_eq!(output.recent_alerts[0].line_number, Some(6));
    }
}
