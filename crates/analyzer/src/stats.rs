//! 집계 통계 -- 파싱된 레코드마다 한 번씩 갱신되는 누적 요약
//!
//! [`AggregateStatistics`]는 세션이 소유하며 세션 동안 감소하지 않습니다.
//! 건너뛴 라인은 [`record_skip`](AggregateStatistics::record_skip)으로만
//! 반영되고 다른 카운터는 변하지 않습니다.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};

use logwarden_core::types::LogLevel;

use crate::parser::Record;

/// 시간대 버킷 키 형식 (레코드 자신의 오프셋 기준)
pub const HOUR_BUCKET_FORMAT: &str = "%Y-%m-%d %H:00";

/// 세션 누적 통계
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStatistics {
    /// 파싱된 레코드 총 수
    pub total_record_count: u64,
    /// 관측된 고유 출발지 주소
    pub unique_source_addresses: HashSet<String>,
    /// 상태 코드별 횟수
    pub status_code_histogram: HashMap<u16, u64>,
    /// HTTP 메서드별 횟수
    pub method_histogram: HashMap<String, u64>,
    /// 경로별 횟수 (상한 없음)
    pub path_histogram: HashMap<String, u64>,
    /// `YYYY-MM-DD HH:00` 버킷별 횟수
    pub hourly_bucket_histogram: HashMap<String, u64>,
    /// 전송 바이트 합계
    pub bytes_transferred_total: u64,
    /// 주소별 에러 응답 수 (단조 증가, 탐지기가 갱신)
    pub error_count_by_address: HashMap<String, u64>,
    /// 가장 이른 레코드 시각
    pub first_record_time: Option<DateTime<FixedOffset>>,
    /// 가장 늦은 레코드 시각
    pub last_record_time: Option<DateTime<FixedOffset>>,
    /// 로그 레벨별 횟수
    pub severity_histogram: HashMap<LogLevel, u64>,
    /// 방언 규칙에 매칭되지 않아 건너뛴 라인 수
    pub skipped_line_count: u64,
    /// 의심 패턴에 매칭된 요청 수 (탐지기가 갱신)
    pub suspicious_request_count: u64,
}

impl AggregateStatistics {
    /// 빈 통계를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드 하나를 반영합니다.
    ///
    /// 갱신 순서는 고정입니다: 총계, 주소, 상태 코드, 메서드, 경로,
    /// 바이트, 시간대 버킷, 최초/최종 시각, 로그 레벨.
    pub fn update(&mut self, record: &Record) {
        self.total_record_count += 1;

        if let Some(addr) = &record.source_address {
            self.unique_source_addresses.insert(addr.clone());
        }
        if let Some(status) = record.status_code {
            *self.status_code_histogram.entry(status).or_insert(0) += 1;
        }
        if let Some(method) = &record.http_method {
            *self.method_histogram.entry(method.clone()).or_insert(0) += 1;
        }
        if let Some(path) = &record.path {
            *self.path_histogram.entry(path.clone()).or_insert(0) += 1;
        }

        self.bytes_transferred_total = self
            .bytes_transferred_total
            .saturating_add(record.bytes_transferred);

        let bucket = record.timestamp.format(HOUR_BUCKET_FORMAT).to_string();
        *self.hourly_bucket_histogram.entry(bucket).or_insert(0) += 1;

        let ts = record.timestamp;
        if self.first_record_time.is_none_or(|first| ts < first) {
            self.first_record_time = Some(ts);
        }
        if self.last_record_time.is_none_or(|last| ts > last) {
            self.last_record_time = Some(ts);
        }

        if let Some(level) = record.severity {
            *self.severity_histogram.entry(level).or_insert(0) += 1;
        }
    }

    /// 건너뛴 라인 하나를 반영합니다.
    pub fn record_skip(&mut self) {
        self.skipped_line_count += 1;
    }

    /// 고유 주소 수
    pub fn unique_source_address_count(&self) -> usize {
        self.unique_source_addresses.len()
    }

    /// 가장 많이 요청된 경로 상위 `n`개
    pub fn top_paths(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.path_histogram, n)
    }

    /// 에러 응답이 가장 많은 주소 상위 `n`개
    pub fn top_error_addresses(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.error_count_by_address, n)
    }

    /// 최근 `n`개 시간대 버킷 (시간 오름차순)
    pub fn recent_hourly_buckets(&self, n: usize) -> Vec<(String, u64)> {
        let mut buckets: Vec<(String, u64)> = self
            .hourly_bucket_histogram
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        buckets.sort_by(|a, b| a.0.cmp(&b.0));
        let skip = buckets.len().saturating_sub(n);
        buckets.split_off(skip)
    }
}

/// 횟수 내림차순, 같은 횟수는 키 오름차순으로 상위 `n`개를 고릅니다.
fn top_n(histogram: &HashMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = histogram
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::parser::parse_line;

    fn web(addr: &str, ts: &str, path: &str, status: u16, bytes: &str) -> Record {
        let line = format!(r#"{addr} - - [{ts}] "GET {path} HTTP/1.1" {status} {bytes}"#);
        parse_line(Dialect::Apache, &line).unwrap()
    }

    #[test]
    fn update_fills_all_histograms() {
        let mut stats = AggregateStatistics::new();
        stats.update(&web("10.0.0.1", "10/Oct/2023:13:55:36 +0000", "/a", 200, "100"));
        stats.update(&web("10.0.0.2", "10/Oct/2023:13:59:00 +0000", "/a", 404, "-"));
        stats.update(&web("10.0.0.1", "10/Oct/2023:14:01:00 +0000", "/b", 200, "50"));

        assert_eq!(stats.total_record_count, 3);
        assert_eq!(stats.unique_source_address_count(), 2);
        assert_eq!(stats.status_code_histogram[&200], 2);
        assert_eq!(stats.status_code_histogram[&404], 1);
        assert_eq!(stats.method_histogram["GET"], 3);
        assert_eq!(stats.path_histogram["/a"], 2);
        assert_eq!(stats.bytes_transferred_total, 150);
        assert_eq!(stats.hourly_bucket_histogram["2023-10-10 13:00"], 2);
        assert_eq!(stats.hourly_bucket_histogram["2023-10-10 14:00"], 1);
        // 에러 카운트는 탐지기 책임
        assert!(stats.error_count_by_address.is_empty());
    }

    #[test]
    fn hour_bucket_uses_record_offset() {
        let mut stats = AggregateStatistics::new();
        stats.update(&web("10.0.0.1", "10/Oct/2023:23:30:00 -0700", "/", 200, "1"));
        assert!(stats.hourly_bucket_histogram.contains_key("2023-10-10 23:00"));
    }

    #[test]
    fn first_and_last_time_are_ordered_for_out_of_order_input() {
        let mut stats = AggregateStatistics::new();
        stats.update(&web("10.0.0.1", "10/Oct/2023:14:00:00 +0000", "/", 200, "1"));
        stats.update(&web("10.0.0.1", "10/Oct/2023:12:00:00 +0000", "/", 200, "1"));
        let first = stats.first_record_time.unwrap();
        let last = stats.last_record_time.unwrap();
        assert!(first <= last);
        assert_eq!(first.format("%H").to_string(), "12");
    }

    #[test]
    fn leveled_records_fill_severity_only() {
        let mut stats = AggregateStatistics::new();
        let rec = parse_line(Dialect::Application, "[2024-01-15 10:30:00] ERROR: boom").unwrap();
        stats.update(&rec);
        assert_eq!(stats.severity_histogram[&LogLevel::Error], 1);
        assert!(stats.status_code_histogram.is_empty());
        assert!(stats.unique_source_addresses.is_empty());
        assert_eq!(stats.total_record_count, 1);
    }

    #[test]
    fn record_skip_touches_only_skip_count() {
        let mut stats = AggregateStatistics::new();
        stats.update(&web("10.0.0.1", "10/Oct/2023:13:55:36 +0000", "/", 200, "1"));
        let before = stats.clone();
        stats.record_skip();
        assert_eq!(stats.skipped_line_count, 1);
        stats.skipped_line_count = 0;
        assert_eq!(stats, before);
    }

    #[test]
    fn top_paths_breaks_ties_by_key() {
        let mut stats = AggregateStatistics::new();
        for path in ["/b", "/a", "/c", "/c"] {
            stats.update(&web("10.0.0.1", "10/Oct/2023:13:55:36 +0000", path, 200, "1"));
        }
        let top = stats.top_paths(2);
        assert_eq!(top, vec![("/c".to_owned(), 2), ("/a".to_owned(), 1)]);
    }

    #[test]
    fn recent_hourly_buckets_keeps_latest() {
        let mut stats = AggregateStatistics::new();
        for hour in ["10", "11", "12"] {
            let ts = format!("10/Oct/2023:{hour}:00:00 +0000");
            stats.update(&web("10.0.0.1", &ts, "/", 200, "1"));
        }
        let recent = stats.recent_hourly_buckets(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].0, "2023-10-10 11:00");
        assert_eq!(recent[1].0, "2023-10-10 12:00");
        assert_eq!(stats.recent_hourly_buckets(10).len(), 3);
    }
}
