//! 로그 방언(dialect) 레지스트리
//!
//! 방언은 로그 라인 형식 하나를 기술하는 불변 스키마입니다.
//! 각 변형은 자신의 라인 매칭 규칙(이름 있는 캡처 그룹을 가진 정규식)과
//! 타임스탬프 형식을 직접 가지고 있으므로, 방언을 추가하려면
//! 변형과 규칙 하나를 추가하면 됩니다.
//!
//! # 지원 형식
//! ```text
//! apache       10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /a HTTP/1.1" 200 512 "-" "curl/8.0"
//! nginx        (apache와 동일, 끝에 추가 필드 허용)
//! application  [2024-01-15 10:30:00] ERROR: Database connection failed
//! generic      2024-01-15T10:30:00Z [WARN] disk usage at 91%
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;

/// 웹 접근 로그 타임스탬프 형식 (`10/Oct/2023:13:55:36 +0000`)
const WEB_TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// 오프셋 없는 애플리케이션 타임스탬프 형식 (UTC로 간주)
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

static APACHE_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"^(?P<addr>[0-9A-Fa-f:.]+) \S+ \S+ \[(?P<ts>[^\]]+)\] "#,
        r#""(?P<method>[A-Z]+) (?P<path>\S+) (?P<proto>[^"\s]+)" "#,
        r#"(?P<status>\d{3}) (?P<bytes>\d+|-)"#,
        r#"(?: "(?P<referrer>[^"]*)" "(?P<agent>[^"]*)")?\s*$"#,
    ))
    .expect("apache dialect rule must compile")
});

static NGINX_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"^(?P<addr>[0-9A-Fa-f:.]+) \S+ \S+ \[(?P<ts>[^\]]+)\] "#,
        r#""(?P<method>[A-Z]+) (?P<path>\S+) (?P<proto>[^"\s]+)" "#,
        r#"(?P<status>\d{3}) (?P<bytes>\d+|-)"#,
        r#"(?: "(?P<referrer>[^"]*)" "(?P<agent>[^"]*)")?(?:\s.*)?$"#,
    ))
    .expect("nginx dialect rule must compile")
});

static APPLICATION_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<ts>[^\]]+)\]\s+(?P<level>[A-Za-z]+):?(?:\s+(?P<msg>.*))?$")
        .expect("application dialect rule must compile")
});

static GENERIC_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:\[(?P<ts>[^\]]+)\]|",
        r"(?P<plain_ts>\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2})?))",
        r"\s+\[(?P<level>[A-Za-z]+)\](?:\s+(?P<msg>.*))?$",
    ))
    .expect("generic dialect rule must compile")
});

/// 로그 방언
///
/// 세션 생성 시 한 번 선택되며, 세션 동안 바뀌지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Apache combined/common 접근 로그
    #[default]
    Apache,
    /// Nginx combined 접근 로그 (끝에 추가 필드 허용)
    Nginx,
    /// `[timestamp] LEVEL: message` 형식의 애플리케이션 로그
    Application,
    /// `timestamp [LEVEL] message` 형식의 일반 로그
    Generic,
}

/// 방언이 채우는 레코드 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectShape {
    /// 주소, 요청 라인, 상태 코드, 전송 바이트를 가진 웹 접근 로그
    Web,
    /// 심각도와 자유 형식 메시지를 가진 로그
    Leveled,
}

impl Dialect {
    /// 등록된 모든 방언
    pub const ALL: [Dialect; 4] = [
        Dialect::Apache,
        Dialect::Nginx,
        Dialect::Application,
        Dialect::Generic,
    ];

    /// 방언 이름을 반환합니다.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Apache => "apache",
            Self::Nginx => "nginx",
            Self::Application => "application",
            Self::Generic => "generic",
        }
    }

    /// 이 방언의 라인 매칭 규칙을 반환합니다.
    pub fn rule(&self) -> &'static Regex {
        match self {
            Self::Apache => &APACHE_RULE,
            Self::Nginx => &NGINX_RULE,
            Self::Application => &APPLICATION_RULE,
            Self::Generic => &GENERIC_RULE,
        }
    }

    /// 이 방언이 생성하는 레코드 형태를 반환합니다.
    pub fn shape(&self) -> DialectShape {
        match self {
            Self::Apache | Self::Nginx => DialectShape::Web,
            Self::Application | Self::Generic => DialectShape::Leveled,
        }
    }

    /// 이 방언이 채우는 레코드 필드 이름 목록
    pub fn field_slots(&self) -> &'static [&'static str] {
        match self.shape() {
            DialectShape::Web => &[
                "timestamp",
                "source_address",
                "http_method",
                "path",
                "protocol",
                "status_code",
                "bytes_transferred",
                "message",
            ],
            DialectShape::Leveled => &["timestamp", "severity", "message"],
        }
    }

    /// 방언별 타임스탬프 문자열을 파싱합니다.
    ///
    /// 파싱할 수 없으면 `None`을 반환합니다. 대체값 결정은 호출자의 몫입니다.
    pub fn parse_timestamp(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        match self.shape() {
            DialectShape::Web => DateTime::parse_from_str(raw, WEB_TIMESTAMP_FORMAT).ok(),
            DialectShape::Leveled => parse_leveled_timestamp(raw),
        }
    }
}

/// 애플리케이션/일반 로그 타임스탬프를 파싱합니다.
///
/// RFC 3339을 먼저 시도하고, 오프셋 없는 형식은 UTC로 간주합니다.
/// Python logging 스타일의 쉼표 밀리초(`10:30:00,123`)도 허용합니다.
fn parse_leveled_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    let normalized = raw.replacen(',', ".", 1);
    if let Ok(dt) = DateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(dt);
    }

    NAIVE_TIMESTAMP_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(&normalized, fmt)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.name() == lowered)
            .ok_or_else(|| AnalyzerError::UnknownDialect(s.to_owned()))
    }
}
