//! 분석 엔진 에러 타입
//!
//! [`AnalyzerError`]는 분석 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<AnalyzerError> for LogwardenError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 라인 단위 파싱 실패는 에러가 아니라 [`ParseSkip`](crate::parser::ParseSkip)으로
//! 표현되며, 세션 드라이버가 경고 로그를 남기고 다음 라인으로 진행합니다.

use logwarden_core::error::{ConfigError, LogwardenError, SourceError};

/// 분석 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// 로그 소스를 열 수 없음 (처리 시작 전 호출자에게 전달)
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable {
        /// 소스 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 알 수 없는 방언 이름
    #[error("unknown dialect: {0}")]
    UnknownDialect(String),

    /// 패턴 파일 로딩 실패
    #[error("pattern load error: {path}: {reason}")]
    PatternLoad {
        /// 패턴 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 패턴 유효성 검증 실패
    #[error("pattern validation error: pattern '{name}': {reason}")]
    PatternValidation {
        /// 문제가 된 패턴 이름
        name: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 분석 결과 내보내기 실패
    #[error("export error: {0}")]
    Export(String),

    /// 모니터 태스크 종료 대기 실패
    #[error("monitor task failed: {0}")]
    MonitorTask(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON 직렬화 에러
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    /// I/O 에러를 소스 경로 정보와 함께 `SourceUnavailable`로 변환합니다.
    pub(crate) fn source_unavailable(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<AnalyzerError> for LogwardenError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::SourceUnavailable { path, reason } => {
                LogwardenError::Source(SourceError::Unavailable { path, reason })
            }
            AnalyzerError::Config { field, reason } => {
                LogwardenError::Config(ConfigError::InvalidValue { field, reason })
            }
            AnalyzerError::Io(e) => LogwardenError::Io(e),
            other => LogwardenError::Analysis(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_display() {
        let err = AnalyzerError::SourceUnavailable {
            path: "/var/log/apache2/access.log".to_owned(),
            reason: "No such file or directory".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("access.log"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn pattern_load_error_display() {
        let err = AnalyzerError::PatternLoad {
            path: "/etc/logwarden/patterns.yml".to_owned(),
            reason: "invalid YAML".to_owned(),
        };
        assert!(err.to_string().contains("patterns.yml"));
    }

    #[test]
    fn source_unavailable_converts_to_source_error() {
        let err = AnalyzerError::SourceUnavailable {
            path: "missing.log".to_owned(),
            reason: "not found".to_owned(),
        };
        let top: LogwardenError = err.into();
        assert!(matches!(top, LogwardenError::Source(_)));
    }

    #[test]
    fn config_converts_to_config_error() {
        let err = AnalyzerError::Config {
            field: "error_threshold".to_owned(),
            reason: "must be greater than 0".to_owned(),
        };
        let top: LogwardenError = err.into();
        assert!(matches!(top, LogwardenError::Config(_)));
    }

    #[test]
    fn other_errors_convert_to_analysis() {
        let err = AnalyzerError::UnknownDialect("iis".to_owned());
        let top: LogwardenError = err.into();
        assert!(matches!(top, LogwardenError::Analysis(_)));
        assert!(top.to_string().contains("iis"));
    }
}
