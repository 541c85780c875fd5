//! 분석 리포트 -- 세션 상태를 사람이 읽는 요약으로 만듭니다.
//!
//! [`AnalysisReport`]는 세션의 특정 시점 스냅샷입니다. 텍스트로 렌더링하거나
//! serde로 직렬화할 수 있습니다.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use logwarden_core::types::LogLevel;

use crate::alert::AlertType;
use crate::dialect::Dialect;
use crate::session::AnalysisSession;

/// 키와 횟수 쌍
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    /// 항목 키 (경로, 시간대 등)
    pub key: String,
    /// 횟수
    pub count: u64,
}

/// 상태 코드 분포 항목
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    /// 상태 코드
    pub status: u16,
    /// 횟수
    pub count: u64,
    /// 전체 레코드 대비 비율 (%)
    pub percentage: f64,
}

/// 에러 응답 상위 주소 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorAddressEntry {
    /// 출발지 주소
    pub address: String,
    /// 에러 응답 수
    pub errors: u64,
    /// 블랙리스트 여부
    pub blacklisted: bool,
}

/// 분석 리포트
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// 리포트 생성 시각
    pub generated_at: DateTime<Utc>,
    /// 방언
    pub dialect: Dialect,
    /// 파싱된 레코드 수
    pub total_records: u64,
    /// 건너뛴 라인 수
    pub skipped_lines: u64,
    /// 고유 출발지 주소 수
    pub unique_source_addresses: usize,
    /// 경과 시간 (초)
    pub elapsed_secs: f64,
    /// 평균 처리량 (레코드/초)
    pub records_per_sec: f64,
    /// 전송 바이트 합계
    pub bytes_transferred_total: u64,
    /// 가장 이른 레코드 시각
    pub first_record_time: Option<DateTime<FixedOffset>>,
    /// 가장 늦은 레코드 시각
    pub last_record_time: Option<DateTime<FixedOffset>>,
    /// 요청 상위 경로
    pub top_paths: Vec<CountEntry>,
    /// 최근 시간대 버킷
    pub hourly_buckets: Vec<CountEntry>,
    /// 상태 코드 분포 (상태 코드 오름차순)
    pub status_distribution: Vec<StatusEntry>,
    /// 에러 응답 상위 주소
    pub top_error_addresses: Vec<ErrorAddressEntry>,
    /// 유형별 알림 수
    pub alert_counts: BTreeMap<AlertType, u64>,
    /// 의심 요청 수
    pub suspicious_requests: u64,
    /// 로그 레벨 분포
    pub severity_distribution: BTreeMap<LogLevel, u64>,
    /// 블랙리스트 주소 (정렬됨)
    pub blacklisted_addresses: Vec<String>,
}

impl AnalysisReport {
    /// 세션 상태로 리포트를 만듭니다.
    pub fn from_session(session: &AnalysisSession) -> Self {
        let stats = session.statistics();
        let top_n = session.top_n();
        let total = stats.total_record_count;

        let elapsed_secs = session.elapsed().as_secs_f64();
        let records_per_sec = if elapsed_secs > 0.0 {
            total as f64 / elapsed_secs
        } else {
            0.0
        };

        let mut status_distribution: Vec<StatusEntry> = stats
            .status_code_histogram
            .iter()
            .map(|(status, count)| StatusEntry {
                status: *status,
                count: *count,
                percentage: percentage(*count, total),
            })
            .collect();
        status_distribution.sort_by_key(|e| e.status);

        let top_error_addresses = stats
            .top_error_addresses(top_n)
            .into_iter()
            .map(|(address, errors)| ErrorAddressEntry {
                blacklisted: session.detector().is_blacklisted(&address),
                address,
                errors,
            })
            .collect();

        let mut alert_counts = BTreeMap::new();
        for alert in session.alerts() {
            *alert_counts.entry(alert.alert_type).or_insert(0) += 1;
        }

        Self {
            generated_at: Utc::now(),
            dialect: session.dialect(),
            total_records: total,
            skipped_lines: stats.skipped_line_count,
            unique_source_addresses: stats.unique_source_address_count(),
            elapsed_secs,
            records_per_sec,
            bytes_transferred_total: stats.bytes_transferred_total,
            first_record_time: stats.first_record_time,
            last_record_time: stats.last_record_time,
            top_paths: to_entries(stats.top_paths(top_n)),
            hourly_buckets: to_entries(stats.recent_hourly_buckets(session.hourly_window())),
            status_distribution,
            top_error_addresses,
            alert_counts,
            suspicious_requests: stats.suspicious_request_count,
            severity_distribution: stats.severity_histogram.iter().map(|(k, v)| (*k, *v)).collect(),
            blacklisted_addresses: session.detector().blacklisted_addresses(),
        }
    }

    /// 전체 알림 수
    pub fn total_alerts(&self) -> u64 {
        self.alert_counts.values().sum()
    }

    /// 사람이 읽는 텍스트 리포트를 씁니다.
    pub fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "Log Analysis Report ({})", self.dialect)?;
        writeln!(w, "{}", "=".repeat(48))?;
        writeln!(w, "Generated:         {}", self.generated_at.to_rfc3339())?;
        writeln!(w, "Records parsed:    {}", self.total_records)?;
        writeln!(w, "Lines skipped:     {}", self.skipped_lines)?;
        writeln!(w, "Unique addresses:  {}", self.unique_source_addresses)?;
        writeln!(w, "Bytes transferred: {}", format_bytes(self.bytes_transferred_total))?;
        writeln!(
            w,
            "Elapsed:           {:.3}s ({:.1} records/s)",
            self.elapsed_secs, self.records_per_sec
        )?;
        if let (Some(first), Some(last)) = (self.first_record_time, self.last_record_time) {
            writeln!(w, "Time range:        {} .. {}", first.to_rfc3339(), last.to_rfc3339())?;
        }

        if !self.status_distribution.is_empty() {
            writeln!(w)?;
            writeln!(w, "Status codes:")?;
            for entry in &self.status_distribution {
                writeln!(
                    w,
                    "  {:>3}  {:>8}  {:>6.2}%",
                    entry.status, entry.count, entry.percentage
                )?;
            }
        }

        if !self.severity_distribution.is_empty() {
            writeln!(w)?;
            writeln!(w, "Severity:")?;
            for (level, count) in &self.severity_distribution {
                writeln!(w, "  {:<8}  {:>8}", level, count)?;
            }
        }

        write_entries(w, "Top paths:", &self.top_paths)?;
        write_entries(w, "Hourly activity:", &self.hourly_buckets)?;

        if !self.top_error_addresses.is_empty() {
            writeln!(w)?;
            writeln!(w, "Top error sources:")?;
            for entry in &self.top_error_addresses {
                let mark = if entry.blacklisted { "  [BLACKLISTED]" } else { "" };
                writeln!(w, "  {:<39}  {:>8}{mark}", entry.address, entry.errors)?;
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "Alerts: {} (suspicious requests: {})",
            self.total_alerts(),
            self.suspicious_requests
        )?;
        for (alert_type, count) in &self.alert_counts {
            writeln!(w, "  {:<18}  {:>8}", alert_type.to_string(), count)?;
        }

        if !self.blacklisted_addresses.is_empty() {
            writeln!(w)?;
            writeln!(w, "Blacklisted: {}", self.blacklisted_addresses.join(", "))?;
        }

        Ok(())
    }
}

fn write_entries(w: &mut dyn Write, title: &str, entries: &[CountEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    writeln!(w, "{title}")?;
    for entry in entries {
        writeln!(w, "  {:>8}  {}", entry.count, entry.key)?;
    }
    Ok(())
}

fn to_entries(pairs: Vec<(String, u64)>) -> Vec<CountEntry> {
    pairs
        .into_iter()
        .map(|(key, count)| CountEntry { key, count })
        .collect()
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// 바이트 수를 사람이 읽기 쉬운 단위로 표시합니다.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {} ({bytes} B)", UNITS[unit])
    }
}
