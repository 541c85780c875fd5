//! CLI-specific error types and exit code mapping

use logwarden_analyzer::AnalyzerError;
use logwarden_core::error::LogwardenError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// The log source could not be opened.
    #[error("{0}")]
    Source(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Pattern file loading or validation failure.
    #[error("pattern error: {0}")]
    Pattern(String),

    /// Logging subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logwarden-core.
    #[error("{0}")]
    Core(#[from] LogwardenError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                     |
    /// |------|-----------------------------|
    /// | 0    | Success                     |
    /// | 1    | General / command error     |
    /// | 2    | Configuration error         |
    /// | 3    | Log source unavailable      |
    /// | 10   | IO error                    |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Source(_) => 3,
            Self::Io(_) => 10,
            Self::Core(LogwardenError::Config(_)) => 2,
            Self::Core(LogwardenError::Source(_)) => 3,
            Self::Core(LogwardenError::Io(_)) => 10,
            Self::Core(LogwardenError::Analysis(_))
            | Self::Command(_)
            | Self::Pattern(_)
            | Self::Logging(_)
            | Self::JsonSerialize(_) => 1,
        }
    }
}

impl From<AnalyzerError> for CliError {
    fn from(e: AnalyzerError) -> Self {
        match e {
            AnalyzerError::SourceUnavailable { .. } => Self::Source(e.to_string()),
            AnalyzerError::Config { .. } | AnalyzerError::UnknownDialect(_) => {
                Self::Config(e.to_string())
            }
            AnalyzerError::PatternLoad { .. }
            | AnalyzerError::PatternValidation { .. }
            | AnalyzerError::Regex(_) => Self::Pattern(e.to_string()),
            AnalyzerError::Io(io) => Self::Io(io),
            other => Self::Command(other.to_string()),
        }
    }
}
