//! 도메인 타입 — 여러 크레이트가 공유하는 공통 타입

use std::fmt;

use serde::{Deserialize, Serialize};

/// 애플리케이션 로그 레벨
///
/// 애플리케이션/일반 로그 라인의 심각도 토큰을 정규화한 값입니다.
/// `Ord` 구현으로 비교가 가능합니다 (`Debug < Info < Warning < Error < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// 디버그 / 트레이스
    Debug,
    /// 정보성 메시지
    #[default]
    Info,
    /// 경고
    Warning,
    /// 에러
    Error,
    /// 치명적 에러
    Critical,
}

impl LogLevel {
    /// 문자열에서 로그 레벨을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않으며, 흔히 쓰이는 축약형도 허용합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" | "debug" => Some(Self::Debug),
            "info" | "information" | "notice" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            "critical" | "crit" | "fatal" | "emerg" | "emergency" | "alert" => {
                Some(Self::Critical)
            }
            _ => None,
        }
    }

    /// 에러 이상의 심각도인지 확인합니다.
    pub fn is_error(&self) -> bool {
        *self >= Self::Error
    }

    /// 대문자 레벨 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
