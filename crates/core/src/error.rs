//! 에러 타입 — 도메인별 에러 정의

/// logwarden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogwardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 소스 에러
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// 분석 엔진 에러
    #[error("analysis error: {0}")]
    Analysis(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 로그 소스 에러
///
/// 세션이 처리를 시작하기 전에 호출자에게 전달되는 치명적 에러입니다.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 소스를 열 수 없음 (파일 없음, 권한 거부 등)
    #[error("source unavailable: {path}: {reason}")]
    Unavailable { path: String, reason: String },
}
