//! 라인 파서 -- 방언 하나를 원시 라인 하나에 적용합니다.
//!
//! [`parse_line`]은 라인이 방언의 규칙에 매칭되면 [`Record`]를,
//! 매칭되지 않으면 [`ParseSkip`]을 반환합니다. 파싱은 순수 함수이며
//! 어떤 부작용도 없습니다. 건너뛴 라인에 대한 경고 로그와 카운팅은
//! 세션 드라이버의 책임입니다.
//!
//! # 사용 예시
//! ```
//! use logwarden_analyzer::{Dialect, parser::parse_line};
//!
//! let line = r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 2326"#;
//! let record = parse_line(Dialect::Apache, line).unwrap();
//! assert_eq!(record.status_code, Some(200));
//! ```

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Captures;
use serde::{Deserialize, Serialize};

use logwarden_core::types::LogLevel;

use crate::dialect::{Dialect, DialectShape};

/// 파싱할 최대 라인 길이 (바이트)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// 파싱된 로그 레코드
///
/// 원시 라인이 방언 규칙에 매칭된 경우에만 생성됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 타임스탬프 (파싱 실패 시 파싱 시각)
    pub timestamp: DateTime<FixedOffset>,
    /// 요청 출발지 주소 (웹 방언 전용)
    pub source_address: Option<String>,
    /// HTTP 메서드
    pub http_method: Option<String>,
    /// 요청 경로
    pub path: Option<String>,
    /// HTTP 프로토콜 (예: `HTTP/1.1`)
    pub protocol: Option<String>,
    /// 응답 상태 코드
    pub status_code: Option<u16>,
    /// 전송 바이트 수 (`-`는 0)
    pub bytes_transferred: u64,
    /// 로그 레벨 (애플리케이션/일반 방언 전용)
    pub severity: Option<LogLevel>,
    /// 메시지 (웹 방언은 요청 라인)
    pub message: String,
    /// Referer 헤더
    pub referrer: Option<String>,
    /// User-Agent 헤더
    pub user_agent: Option<String>,
    /// 원시 라인
    pub raw_line: String,
    /// 1부터 시작하는 라인 번호 (배치 모드 전용)
    pub line_number: Option<u64>,
}

impl Record {
    /// 에러 응답(4xx/5xx) 레코드인지 확인합니다.
    pub fn is_error_response(&self) -> bool {
        self.status_code.is_some_and(|code| code >= 400)
    }

    /// 배치 모드 라인 번호를 설정합니다.
    pub fn with_line_number(mut self, line_number: u64) -> Self {
        self.line_number = Some(line_number);
        self
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source_address, self.status_code) {
            (Some(addr), Some(status)) => write!(
                f,
                "{} {} {} -> {}",
                self.timestamp.to_rfc3339(),
                addr,
                self.message,
                status
            ),
            _ => match self.severity {
                Some(level) => write!(
                    f,
                    "{} [{}] {}",
                    self.timestamp.to_rfc3339(),
                    level,
                    self.message
                ),
                None => write!(f, "{} {}", self.timestamp.to_rfc3339(), self.message),
            },
        }
    }
}

/// 라인 건너뜀 사유
///
/// 활성 방언에 매칭되지 않는 라인은 레코드를 만들지 않고 이 값을 반환합니다.
/// 치명적이지 않으며 세션은 다음 라인으로 계속 진행합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line skipped by {dialect} parser: {reason}")]
pub struct ParseSkip {
    /// 활성 방언
    pub dialect: Dialect,
    /// 건너뛴 사유
    pub reason: SkipReason,
}

/// 건너뜀 사유 분류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 빈 라인
    Empty,
    /// 최대 길이 초과
    TooLong(usize),
    /// 방언 규칙 불일치
    NoMatch,
    /// 규칙은 매칭되었지만 필드 디코딩 실패
    InvalidField(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty line"),
            Self::TooLong(len) => {
                write!(f, "line too long: {len} bytes (max: {MAX_LINE_LENGTH})")
            }
            Self::NoMatch => f.write_str("line does not match dialect rule"),
            Self::InvalidField(field) => write!(f, "invalid value in field '{field}'"),
        }
    }
}

/// 원시 라인 하나를 방언으로 파싱합니다.
///
/// 줄바꿈 문자(`\r`, `\n`)는 제거됩니다. 타임스탬프를 해석할 수 없으면
/// 현재 시각으로 대체하며, 이 때문에 처리가 중단되지는 않습니다.
pub fn parse_line(dialect: Dialect, raw_line: &str) -> Result<Record, ParseSkip> {
    let skip = |reason| ParseSkip { dialect, reason };

    let line = raw_line.trim_end_matches(['\r', '\n']);
    if line.len() > MAX_LINE_LENGTH {
        return Err(skip(SkipReason::TooLong(line.len())));
    }
    if line.trim().is_empty() {
        return Err(skip(SkipReason::Empty));
    }

    let caps = dialect
        .rule()
        .captures(line)
        .ok_or_else(|| skip(SkipReason::NoMatch))?;

    let raw_ts = caps
        .name("ts")
        .or_else(|| caps.name("plain_ts"))
        .map(|m| m.as_str())
        .unwrap_or_default();
    let timestamp = dialect.parse_timestamp(raw_ts).unwrap_or_else(|| {
        tracing::debug!(
            dialect = %dialect,
            timestamp = raw_ts,
            "unparseable timestamp, using current time"
        );
        Utc::now().fixed_offset()
    });

    match dialect.shape() {
        DialectShape::Web => web_record(&caps, timestamp, line).map_err(skip),
        DialectShape::Leveled => Ok(leveled_record(&caps, timestamp, line)),
    }
}

/// 웹 방언 캡처에서 레코드를 만듭니다.
fn web_record(
    caps: &Captures<'_>,
    timestamp: DateTime<FixedOffset>,
    line: &str,
) -> Result<Record, SkipReason> {
    let text = |name: &str| caps.name(name).map(|m| m.as_str().to_owned());

    let status_code = caps
        .name("status")
        .map(|m| m.as_str().parse::<u16>())
        .transpose()
        .map_err(|_| SkipReason::InvalidField("status_code"))?;

    let bytes_transferred = match caps.name("bytes").map(|m| m.as_str()) {
        None | Some("-") => 0,
        Some(digits) => digits
            .parse::<u64>()
            .map_err(|_| SkipReason::InvalidField("bytes_transferred"))?,
    };

    let http_method = text("method");
    let path = text("path");
    let protocol = text("proto");
    let message = [http_method.as_deref(), path.as_deref(), protocol.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Record {
        timestamp,
        source_address: text("addr"),
        http_method,
        path,
        protocol,
        status_code,
        bytes_transferred,
        severity: None,
        message,
        referrer: text("referrer").filter(|r| r != "-"),
        user_agent: text("agent").filter(|a| a != "-"),
        raw_line: line.to_owned(),
        line_number: None,
    })
}

/// 애플리케이션/일반 방언 캡처에서 레코드를 만듭니다.
fn leveled_record(caps: &Captures<'_>, timestamp: DateTime<FixedOffset>, line: &str) -> Record {
    let severity = caps
        .name("level")
        .and_then(|m| LogLevel::from_str_loose(m.as_str()));
    let message = caps
        .name("msg")
        .map(|m| m.as_str().trim().to_owned())
        .unwrap_or_default();

    Record {
        timestamp,
        source_address: None,
        http_method: None,
        path: None,
        protocol: None,
        status_code: None,
        bytes_transferred: 0,
        severity,
        message,
        referrer: None,
        user_agent: None,
        raw_line: line.to_owned(),
        line_number: None,
    }
}
