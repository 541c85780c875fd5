//! Command handlers -- one module per subcommand

pub mod analyze;
pub mod config;
pub mod dialects;
pub mod monitor;
pub mod patterns;

use std::path::Path;

use logwarden_analyzer::{AnalysisSession, AnalyzerConfig, Dialect};
use logwarden_core::config::AnalyzerSection;

use crate::cli::SessionArgs;
use crate::error::CliError;

/// Builds the analyzer config from the `[analyzer]` section and CLI overrides.
///
/// CLI flags win over file and environment values.
pub fn resolve_analyzer_config(
    section: &AnalyzerSection,
    args: &SessionArgs,
) -> Result<AnalyzerConfig, CliError> {
    let mut config = AnalyzerConfig::from_core(section)?;

    if let Some(dialect) = &args.dialect {
        config.dialect = dialect.parse::<Dialect>()?;
    }
    if let Some(path) = &args.patterns {
        config.patterns_file = Some(path.display().to_string());
    }
    if let Some(path) = &args.export {
        config.export_path = Some(path.display().to_string());
    }
    if let Some(threshold) = args.error_threshold {
        config.error_threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}

/// Writes the structured document when an export path is configured.
///
/// Returns the path written to.
pub async fn export_if_requested(
    session: &AnalysisSession,
    export_path: Option<&str>,
) -> Result<Option<String>, CliError> {
    let Some(path) = export_path else {
        return Ok(None);
    };
    session
        .export_document()
        .write_json(Path::new(path))
        .await
        .map_err(|e| CliError::Command(e.to_string()))?;
    Ok(Some(path.to_owned()))
}
