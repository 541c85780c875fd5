//! logwarden CLI library
//!
//! The binary in `main.rs` only parses arguments and maps errors to exit
//! codes; everything else lives here so integration tests can drive the
//! command handlers directly.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

use logwarden_core::config::LogwardenConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Runs one CLI invocation.
///
/// The configuration file is optional: a missing file at the given path falls
/// back to defaults. `config validate` reports load errors itself instead of
/// failing up front.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = LogwardenConfig::load_or_default(&cli.config).await;

    let (level, format) = match &loaded {
        Ok(config) => (
            config.general.log_level.clone(),
            config.general.log_format.clone(),
        ),
        Err(_) => ("info".to_owned(), "pretty".to_owned()),
    };
    let level = cli.log_level.clone().unwrap_or(level);
    logging::init_tracing(&level, &format)?;
    logwarden_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "logwarden starting");

    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Dialects => writer.render(&commands::dialects::list()),
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
        Commands::Analyze(args) => commands::analyze::execute(args, &loaded?, &writer).await,
        Commands::Monitor(args) => commands::monitor::execute(args, &loaded?, &writer).await,
        Commands::Patterns(args) => commands::patterns::execute(args, &loaded?, &writer).await,
    }
}
