//! 알림 타입과 알림 발생률 윈도우
//!
//! [`Alert`]는 생성 후 변경되지 않으며 세션의 알림 목록에 추가만 됩니다.
//! [`AlertRateWindow`]는 스트리밍 모드에서 최근 알림 발생률을 추적하고
//! 윈도우 내 알림 수가 임계값을 넘는 동안 검사마다 `HighAlertRate` 메타 알림을 발생시킵니다.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 알림 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertType {
    /// 의심 패턴에 매칭된 요청
    SuspiciousRequest,
    /// 에러 임계값에 도달하여 블랙리스트에 추가된 주소
    IpBlacklisted,
    /// 애플리케이션 로그의 Error/Critical 레코드
    ApplicationError,
    /// 짧은 시간 동안 알림이 임계값보다 많이 발생 (메타 알림)
    HighAlertRate,
}

impl AlertType {
    /// 메트릭 레이블 등에 쓰는 snake_case 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuspiciousRequest => "suspicious_request",
            Self::IpBlacklisted => "ip_blacklisted",
            Self::ApplicationError => "application_error",
            Self::HighAlertRate => "high_alert_rate",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SuspiciousRequest => "SuspiciousRequest",
            Self::IpBlacklisted => "IpBlacklisted",
            Self::ApplicationError => "ApplicationError",
            Self::HighAlertRate => "HighAlertRate",
        };
        f.write_str(s)
    }
}

/// 보안 알림
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// 생성 시각
    pub timestamp: DateTime<Utc>,
    /// 알림 유형
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// 사람이 읽는 설명
    pub message: String,
    /// 원인 레코드의 라인 번호 (배치 모드)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    /// 원인 레코드의 출발지 주소
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
}

impl Alert {
    /// 현재 시각으로 알림을 생성합니다.
    pub fn new(alert_type: AlertType, message: impl Into<String>) -> Self {
        Self::at(Utc::now(), alert_type, message)
    }

    /// 지정한 시각으로 알림을 생성합니다.
    pub fn at(timestamp: DateTime<Utc>, alert_type: AlertType, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            alert_type,
            message: message.into(),
            line_number: None,
            source_address: None,
        }
    }

    /// 라인 번호를 설정합니다.
    pub fn with_line_number(mut self, line_number: Option<u64>) -> Self {
        self.line_number = line_number;
        self
    }

    /// 출발지 주소를 설정합니다.
    pub fn with_source_address(mut self, source_address: Option<String>) -> Self {
        self.source_address = source_address;
        self
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.alert_type,
            self.message
        )?;
        if let Some(line) = self.line_number {
            write!(f, " (line {line})")?;
        }
        Ok(())
    }
}

/// 슬라이딩 윈도우 알림 발생률 추적기
///
/// 세션에 추가된 모든 알림(메타 알림 포함)의 시각을 시간순 버퍼에 보관하고,
/// 윈도우 밖으로 밀려난 항목은 검사 시점에 앞에서부터 제거합니다.
#[derive(Debug, Clone)]
pub struct AlertRateWindow {
    window: Duration,
    threshold: usize,
    timestamps: VecDeque<DateTime<Utc>>,
}

impl AlertRateWindow {
    /// 새 윈도우를 만듭니다.
    pub fn new(window: Duration, threshold: usize) -> Self {
        Self {
            window,
            threshold,
            timestamps: VecDeque::new(),
        }
    }

    /// 알림을 기록합니다.
    pub fn record(&mut self, alert: &Alert) {
        // 시각이 역행하면 버퍼 정렬을 유지하기 위해 마지막 시각으로 맞춥니다.
        let ts = match self.timestamps.back() {
            Some(last) if alert.timestamp < *last => *last,
            _ => alert.timestamp,
        };
        self.timestamps.push_back(ts);
    }

    /// `now` 기준 윈도우 내 알림 수를 세고, 임계값을 넘으면
    /// `HighAlertRate` 알림을 반환합니다.
    pub fn check(&mut self, now: DateTime<Utc>) -> Option<Alert> {
        let window = chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::MAX);
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        while self.timestamps.front().is_some_and(|ts| *ts <= cutoff) {
            self.timestamps.pop_front();
        }

        let count = self.timestamps.len();
        if count <= self.threshold {
            return None;
        }

        Some(Alert::at(
            now,
            AlertType::HighAlertRate,
            format!(
                "{count} alerts in the last {}s (threshold: {})",
                self.window.as_secs(),
                self.threshold
            ),
        ))
    }

    /// 현재 윈도우에 남아 있는 알림 수 (마지막 검사 기준)
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// 윈도우가 비었는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
