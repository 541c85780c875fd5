//! 설정 관리 — logwarden.toml 파싱 및 런타임 설정
//!
//! [`LogwardenConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGWARDEN_ANALYZER_DIALECT=nginx` 형식)
//! 3. 설정 파일 (`logwarden.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logwarden_core::error::LogwardenError> {
//! use logwarden_core::config::LogwardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogwardenConfig::load("logwarden.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogwardenConfig::parse("[analyzer]\ndialect = \"nginx\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogwardenError};

/// 지원하는 방언(dialect) 이름 목록
pub const KNOWN_DIALECTS: &[&str] = &["apache", "nginx", "application", "generic"];

/// logwarden 통합 설정
///
/// `logwarden.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 구성 요소는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogwardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 분석 엔진 설정
    #[serde(default)]
    pub analyzer: AnalyzerSection,
}

impl LogwardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogwardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값을 사용하여 로드합니다.
    ///
    /// CLI처럼 설정 파일이 선택 사항인 경우에 사용합니다.
    /// 파일이 존재하지만 파싱에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, LogwardenError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(LogwardenError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogwardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogwardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogwardenError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogwardenError> {
        toml::from_str(toml_str).map_err(|e| {
            LogwardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGWARDEN_{SECTION}_{FIELD}`
    /// 예: `LOGWARDEN_ANALYZER_ERROR_THRESHOLD=20`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGWARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGWARDEN_GENERAL_LOG_FORMAT");

        // Analyzer
        override_string(&mut self.analyzer.dialect, "LOGWARDEN_ANALYZER_DIALECT");
        override_u64(
            &mut self.analyzer.error_threshold,
            "LOGWARDEN_ANALYZER_ERROR_THRESHOLD",
        );
        override_usize(
            &mut self.analyzer.high_alert_threshold,
            "LOGWARDEN_ANALYZER_HIGH_ALERT_THRESHOLD",
        );
        override_u64(
            &mut self.analyzer.alert_window_secs,
            "LOGWARDEN_ANALYZER_ALERT_WINDOW_SECS",
        );
        override_u64(
            &mut self.analyzer.poll_interval_ms,
            "LOGWARDEN_ANALYZER_POLL_INTERVAL_MS",
        );
        override_usize(&mut self.analyzer.top_n, "LOGWARDEN_ANALYZER_TOP_N");
        override_usize(
            &mut self.analyzer.hourly_window,
            "LOGWARDEN_ANALYZER_HOURLY_WINDOW",
        );
        override_optional_string(
            &mut self.analyzer.patterns_file,
            "LOGWARDEN_ANALYZER_PATTERNS_FILE",
        );
        override_optional_string(
            &mut self.analyzer.export_path,
            "LOGWARDEN_ANALYZER_EXPORT_PATH",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogwardenError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // dialect 검증
        let dialect = self.analyzer.dialect.to_ascii_lowercase();
        if !KNOWN_DIALECTS.contains(&dialect.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "analyzer.dialect".to_owned(),
                reason: format!("must be one of: {}", KNOWN_DIALECTS.join(", ")),
            }
            .into());
        }

        if self.analyzer.error_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analyzer.error_threshold".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.analyzer.alert_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analyzer.alert_window_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.analyzer.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analyzer.poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 분석 엔진 설정 섹션
///
/// `[analyzer]` 섹션에 대응합니다. 분석 엔진은
/// `AnalyzerConfig::from_core`로 이 값을 자기 설정으로 변환합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSection {
    /// 로그 방언 (apache, nginx, application, generic)
    pub dialect: String,
    /// 주소별 에러 응답 임계값 (도달 시 블랙리스트)
    pub error_threshold: u64,
    /// 슬라이딩 윈도우 내 알림 수 임계값 (초과 시 HighAlertRate)
    pub high_alert_threshold: usize,
    /// 알림 발생률 윈도우 (초)
    pub alert_window_secs: u64,
    /// 모니터 모드 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 리포트 상위 항목 수
    pub top_n: usize,
    /// 리포트에 표시할 최근 시간대 버킷 수
    pub hourly_window: usize,
    /// 의심 패턴 YAML 파일 (없으면 기본 패턴 세트)
    pub patterns_file: Option<String>,
    /// 분석 결과 JSON 내보내기 경로
    pub export_path: Option<String>,
}

impl Default for AnalyzerSection {
    fn default() -> Self {
        Self {
            dialect: "apache".to_owned(),
            error_threshold: 10,
            high_alert_threshold: 5,
            alert_window_secs: 60,
            poll_interval_ms: 1000,
            top_n: 10,
            hourly_window: 24,
            patterns_file: None,
            export_path: None,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_optional_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.trim().is_empty() {
            None
        } else {
            Some(val)
        };
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
