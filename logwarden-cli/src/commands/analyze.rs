//! `logwarden analyze` command handler

use tracing::info;

use logwarden_analyzer::AnalysisSession;
use logwarden_core::config::LogwardenConfig;

use crate::cli::AnalyzeArgs;
use crate::commands::{export_if_requested, resolve_analyzer_config};
use crate::error::CliError;
use crate::output::{AnalysisOutput, OutputWriter};

/// Execute the `analyze` command.
pub async fn execute(
    args: AnalyzeArgs,
    config: &LogwardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let output = run(&args, config).await?;
    writer.render(&output)
}

/// Runs a batch analysis and builds the output payload.
pub async fn run(args: &AnalyzeArgs, config: &LogwardenConfig) -> Result<AnalysisOutput, CliError> {
    let analyzer_config = resolve_analyzer_config(&config.analyzer, &args.session)?;
    let mut session = AnalysisSession::from_config(&analyzer_config).await?;

    info!(
        path = %args.file.display(),
        dialect = %analyzer_config.dialect,
        "analyzing log file"
    );
    let report = session.analyze_file(&args.file).await?;

    let exported_to = export_if_requested(&session, analyzer_config.export_path.as_deref()).await?;

    let mut output = AnalysisOutput::new(args.file.display().to_string(), report, session.alerts());
    output.exported_to = exported_to;
    Ok(output)
}
