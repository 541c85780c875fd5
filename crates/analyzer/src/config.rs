//! 분석 엔진 설정
//!
//! [`AnalyzerConfig`]는 core의 [`AnalyzerSection`](logwarden_core::config::AnalyzerSection)을
//! 기반으로 방언 이름을 [`Dialect`]로 해석한 분석 엔진 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```
//! use logwarden_core::config::LogwardenConfig;
//! use logwarden_analyzer::config::AnalyzerConfig;
//!
//! let core_config = LogwardenConfig::default();
//! let config = AnalyzerConfig::from_core(&core_config.analyzer).unwrap();
//! assert_eq!(config.error_threshold, 10);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::AnalyzerError;

const MAX_ERROR_THRESHOLD: u64 = 1_000_000;
const MAX_ALERT_WINDOW_SECS: u64 = 86_400; // 1 day
const MAX_POLL_INTERVAL_MS: u64 = 60_000; // 1 minute
const MAX_TOP_N: usize = 1_000;
const MAX_HOURLY_WINDOW: usize = 24 * 366;

/// 분석 엔진 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// 로그 방언
    pub dialect: Dialect,
    /// 주소별 에러 응답 임계값
    pub error_threshold: u64,
    /// 슬라이딩 윈도우 알림 수 임계값
    pub high_alert_threshold: usize,
    /// 알림 발생률 윈도우 (초)
    pub alert_window_secs: u64,
    /// 모니터 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 리포트 상위 항목 수
    pub top_n: usize,
    /// 리포트 최근 시간대 버킷 수
    pub hourly_window: usize,
    /// 의심 패턴 YAML 파일
    pub patterns_file: Option<String>,
    /// JSON 내보내기 경로
    pub export_path: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Apache,
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

impl AnalyzerConfig {
    /// core의 `AnalyzerSection`에서 분석 엔진 설정을 생성합니다.
    ///
    /// # Errors
    /// 방언 이름을 알 수 없는 경우
    pub fn from_core(core: &logwarden_core::config::AnalyzerSection) -> Result<Self, AnalyzerError> {
        Ok(Self {
            dialect: core.dialect.parse()?,
            error_threshold: core.error_threshold,
            high_alert_threshold: core.high_alert_threshold,
            alert_window_secs: core.alert_window_secs,
            poll_interval_ms: core.poll_interval_ms,
            top_n: core.top_n,
            hourly_window: core.hourly_window,
            patterns_file: core.patterns_file.clone(),
            export_path: core.export_path.clone(),
        })
    }

    /// 폴링 주기
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 알림 발생률 윈도우
    pub fn alert_window(&self) -> Duration {
        Duration::from_secs(self.alert_window_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.error_threshold == 0 || self.error_threshold > MAX_ERROR_THRESHOLD {
            return Err(AnalyzerError::Config {
                field: "error_threshold".to_owned(),
                reason: format!("must be 1-{MAX_ERROR_THRESHOLD}"),
            });
        }

        if self.alert_window_secs == 0 || self.alert_window_secs > MAX_ALERT_WINDOW_SECS {
            return Err(AnalyzerError::Config {
                field: "alert_window_secs".to_owned(),
                reason: format!("must be 1-{MAX_ALERT_WINDOW_SECS}"),
            });
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(AnalyzerError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            });
        }

        if self.top_n == 0 || self.top_n > MAX_TOP_N {
            return Err(AnalyzerError::Config {
                field: "top_n".to_owned(),
                reason: format!("must be 1-{MAX_TOP_N}"),
            });
        }

        if self.hourly_window == 0 || self.hourly_window > MAX_HOURLY_WINDOW {
            return Err(AnalyzerError::Config {
                field: "hourly_window".to_owned(),
                reason: format!("must be 1-{MAX_HOURLY_WINDOW}"),
            });
        }

        for (field, value) in [
            ("patterns_file", &self.patterns_file),
            ("export_path", &self.export_path),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AnalyzerError::Config {
                    field: field.to_owned(),
                    reason: "path must not be empty".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// 분석 엔진 설정 빌더
#[derive(Default)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 방언을 설정합니다.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = dialect;
        self
    }

    /// 에러 임계값을 설정합니다.
    pub fn error_threshold(mut self, threshold: u64) -> Self {
        self.config.error_threshold = threshold;
        self
    }

    /// 알림 발생률 임계값을 설정합니다.
    pub fn high_alert_threshold(mut self, threshold: usize) -> Self {
        self.config.high_alert_threshold = threshold;
        self
    }

    /// 알림 발생률 윈도우(초)를 설정합니다.
    pub fn alert_window_secs(mut self, secs: u64) -> Self {
        self.config.alert_window_secs = secs;
        self
    }

    /// 폴링 주기(밀리초)를 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 리포트 상위 항목 수를 설정합니다.
    pub fn top_n(mut self, n: usize) -> Self {
        self.config.top_n = n;
        self
    }

    /// 리포트 시간대 버킷 수를 설정합니다.
    pub fn hourly_window(mut self, n: usize) -> Self {
        self.config.hourly_window = n;
        self
    }

    /// 의심 패턴 파일을 설정합니다.
    pub fn patterns_file(mut self, path: impl Into<String>) -> Self {
        self.config.patterns_file = Some(path.into());
        self
    }

    /// 내보내기 경로를 설정합니다.
    pub fn export_path(mut self, path: impl Into<String>) -> Self {
        self.config.export_path = Some(path.into());
        self
    }

    /// 설정을 검증하고 `AnalyzerConfig`를 생성합니다.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
