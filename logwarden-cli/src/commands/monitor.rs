//! `logwarden monitor` command handler
//!
//! Follows the file until Ctrl-C, then prints the final report and
//! optionally writes the structured document.

use std::path::Path;

use tracing::{info, warn};

use logwarden_analyzer::{AnalysisSession, AnalyzerConfig, MonitorHandle, start_monitor};
use logwarden_core::config::LogwardenConfig;

use crate::cli::MonitorArgs;
use crate::commands::{export_if_requested, resolve_analyzer_config};
use crate::error::CliError;
use crate::output::{AnalysisOutput, OutputWriter};

/// Execute the `monitor` command.
pub async fn execute(
    args: MonitorArgs,
    config: &LogwardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let (handle, analyzer_config) = start(&args, config).await?;

    let cancel = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping monitor");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    let output = finish(handle, &args.file, analyzer_config.export_path.as_deref()).await;
    interrupt.abort();

    writer.render(&output?)
}

/// Resolves the session config and starts the monitor task.
pub async fn start(
    args: &MonitorArgs,
    config: &LogwardenConfig,
) -> Result<(MonitorHandle, AnalyzerConfig), CliError> {
    let mut analyzer_config = resolve_analyzer_config(&config.analyzer, &args.session)?;
    if let Some(ms) = args.poll_interval_ms {
        analyzer_config.poll_interval_ms = ms;
        analyzer_config.validate()?;
    }

    let session = AnalysisSession::from_config(&analyzer_config).await?;
    let handle = start_monitor(session, &args.file, analyzer_config.poll_interval()).await?;

    info!(
        path = %args.file.display(),
        dialect = %analyzer_config.dialect,
        "monitoring log file (Ctrl-C to stop)"
    );
    Ok((handle, analyzer_config))
}

/// Waits for the monitor to stop and builds the output payload.
pub async fn finish(
    handle: MonitorHandle,
    source: &Path,
    export_path: Option<&str>,
) -> Result<AnalysisOutput, CliError> {
    let outcome = handle.join().await?;
    let exported_to = export_if_requested(&outcome.session, export_path).await?;

    let mut output = AnalysisOutput::new(
        source.display().to_string(),
        outcome.report,
        outcome.session.alerts(),
    );
    output.stop_reason = Some(outcome.stop_reason.to_string());
    output.exported_to = exported_to;
    Ok(output)
}
