//! 보안 탐지기 -- 레코드마다 의심 패턴, 에러 임계값, 애플리케이션 에러를 검사합니다.
//!
//! [`SecurityDetector::evaluate`]는 통계 갱신 직후에 호출되며,
//! 세 가지 검사는 서로 독립적이므로 한 레코드에서 여러 알림이 나올 수 있습니다.
//!
//! 1. 의심 패턴: 경로, 그다음 메시지를 패턴 순서대로 검사하며 첫 매칭만 알림
//! 2. 에러 임계값: 4xx/5xx 응답마다 주소별 카운트를 올리고,
//!    임계값에 처음 도달한 순간 주소를 블랙리스트에 추가 (엣지 트리거)
//! 3. 애플리케이션 에러: Error/Critical 레벨 레코드

use std::collections::HashSet;

use crate::alert::{Alert, AlertType};
use crate::parser::Record;
use crate::pattern::PatternSet;
use crate::stats::AggregateStatistics;

/// 기본 주소별 에러 임계값
pub const DEFAULT_ERROR_THRESHOLD: u64 = 10;

/// 보안 탐지기
///
/// 블랙리스트는 세션 동안 항목이 추가만 되며 제거되지 않습니다.
#[derive(Debug, Clone)]
pub struct SecurityDetector {
    patterns: PatternSet,
    error_threshold: u64,
    blacklist: HashSet<String>,
}

impl SecurityDetector {
    /// 새 탐지기를 만듭니다.
    pub fn new(patterns: PatternSet, error_threshold: u64) -> Self {
        Self {
            patterns,
            error_threshold,
            blacklist: HashSet::new(),
        }
    }

    /// 레코드를 평가하여 발생한 알림을 반환합니다.
    ///
    /// 주소별 에러 카운트와 의심 요청 수는 `stats`에 기록됩니다.
    pub fn evaluate(&mut self, record: &Record, stats: &mut AggregateStatistics) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if let Some(alert) = self.check_suspicious(record, stats) {
            alerts.push(alert);
        }
        if let Some(alert) = self.check_error_threshold(record, stats) {
            alerts.push(alert);
        }
        if let Some(alert) = check_application_error(record) {
            alerts.push(alert);
        }

        alerts
    }

    fn check_suspicious(
        &self,
        record: &Record,
        stats: &mut AggregateStatistics,
    ) -> Option<Alert> {
        let mut candidates = Vec::with_capacity(2);
        if let Some(path) = record.path.as_deref() {
            candidates.push(path);
        }
        if !record.message.is_empty() {
            candidates.push(record.message.as_str());
        }

        let (pattern, matched) = self.patterns.first_match(&candidates)?;
        stats.suspicious_request_count += 1;

        let addr = record.source_address.as_deref().unwrap_or("unknown");
        tracing::debug!(
            pattern = pattern.name(),
            source = addr,
            line = record.line_number,
            "suspicious request detected"
        );

        Some(
            Alert::new(
                AlertType::SuspiciousRequest,
                format!("{} from {addr}: {matched}", pattern.name()),
            )
            .with_line_number(record.line_number)
            .with_source_address(record.source_address.clone()),
        )
    }

    fn check_error_threshold(
        &mut self,
        record: &Record,
        stats: &mut AggregateStatistics,
    ) -> Option<Alert> {
        if !record.is_error_response() {
            return None;
        }
        let addr = record.source_address.as_ref()?;

        let count = stats
            .error_count_by_address
            .entry(addr.clone())
            .or_insert(0);
        *count += 1;

        if *count < self.error_threshold || self.blacklist.contains(addr) {
            return None;
        }

        self.blacklist.insert(addr.clone());
        tracing::info!(
            source = %addr,
            errors = *count,
            threshold = self.error_threshold,
            "address blacklisted"
        );

        Some(
            Alert::new(
                AlertType::IpBlacklisted,
                format!(
                    "{addr} blacklisted after {count} error responses (threshold: {})",
                    self.error_threshold
                ),
            )
            .with_line_number(record.line_number)
            .with_source_address(Some(addr.clone())),
        )
    }

    /// 주소가 블랙리스트에 있는지 확인합니다.
    pub fn is_blacklisted(&self, addr: &str) -> bool {
        self.blacklist.contains(addr)
    }

    /// 블랙리스트 (정렬됨)
    pub fn blacklisted_addresses(&self) -> Vec<String> {
        let mut addrs: Vec<String> = self.blacklist.iter().cloned().collect();
        addrs.sort();
        addrs
    }

    /// 주소별 에러 임계값
    pub fn error_threshold(&self) -> u64 {
        self.error_threshold
    }

    /// 사용 중인 패턴 세트
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }
}

fn check_application_error(record: &Record) -> Option<Alert> {
    let level = record.severity?;
    if !level.is_error() {
        return None;
    }
    Some(
        Alert::new(
            AlertType::ApplicationError,
            format!("{level}: {}", record.message),
        )
        .with_line_number(record.line_number)
        .with_source_address(record.source_address.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::parser::parse_line;

    fn web(addr: &str, path: &str, status: u16) -> Record {
        let line = format!(
            r#"{addr} - - [10/Oct/2023:13:55:36 +0000] "GET {path} HTTP/1.1" {status} 100"#
        );
        parse_line(Dialect::Apache, &line).unwrap()
    }

    fn detector(threshold: u64) -> SecurityDetector {
        SecurityDetector::new(PatternSet::default(), threshold)
    }

    fn run(det: &mut SecurityDetector, stats: &mut AggregateStatistics, rec: &Record) -> Vec<Alert> {
        stats.update(rec);
        det.evaluate(rec, stats)
    }

    #[test]
    fn blacklists_exactly_once_at_threshold() {
        let mut det = detector(10);
        let mut stats = AggregateStatistics::new();
        let rec = web("10.0.0.1", "/api", 500);

        for i in 1..=9 {
            assert!(run(&mut det, &mut stats, &rec).is_empty(), "request {i}");
        }
        let alerts = run(&mut det, &mut stats, &rec);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::IpBlacklisted);
        assert_eq!(alerts[0].source_address.as_deref(), Some("10.0.0.1"));
        assert!(det.is_blacklisted("10.0.0.1"));

        assert!(run(&mut det, &mut stats, &rec).is_empty());
        assert_eq!(stats.error_count_by_address["10.0.0.1"], 11);
    }

    #[test]
    fn success_responses_do_not_count() {
        let mut det = detector(1);
        let mut stats = AggregateStatistics::new();
        run(&mut det, &mut stats, &web("10.0.0.1", "/", 200));
        run(&mut det, &mut stats, &web("10.0.0.1", "/", 304));
        assert!(stats.error_count_by_address.is_empty());
        assert!(det.blacklisted_addresses().is_empty());
    }

    #[test]
    fn suspicious_request_and_threshold_fire_on_same_record() {
        let mut det = detector(1);
        let mut stats = AggregateStatistics::new();
        let alerts = run(&mut det, &mut stats, &web("10.0.0.9", "/admin/../../../etc/passwd", 404));
        let types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
        assert_eq!(
            types,
            vec![AlertType::SuspiciousRequest, AlertType::IpBlacklisted]
        );
        assert_eq!(stats.suspicious_request_count, 1);
    }

    #[test]
    fn suspicious_alert_names_pattern_and_path() {
        let mut det = detector(10);
        let mut stats = AggregateStatistics::new();
        let alerts = run(&mut det, &mut stats, &web("10.0.0.9", "/admin/../../../etc/passwd", 404));
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("path_traversal"));
        assert!(alerts[0].message.contains("/admin/../../../etc/passwd"));
        assert!(alerts[0].message.contains("10.0.0.9"));
    }

    #[test]
    fn application_error_levels_raise_alerts() {
        let mut det = detector(10);
        let mut stats = AggregateStatistics::new();
        let err = parse_line(Dialect::Application, "[2024-01-15 10:30:00] ERROR: db down").unwrap();
        let crit = parse_line(Dialect::Generic, "2024-01-15T10:30:00Z [CRITICAL] oom").unwrap();
        let warn = parse_line(Dialect::Application, "[2024-01-15 10:30:00] WARN: slow").unwrap();

        let alerts = run(&mut det, &mut stats, &err);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::ApplicationError);
        assert!(alerts[0].message.contains("db down"));

        assert_eq!(run(&mut det, &mut stats, &crit).len(), 1);
        assert!(run(&mut det, &mut stats, &warn).is_empty());
    }

    #[test]
    fn application_message_is_checked_for_patterns() {
        let mut det = detector(10);
        let mut stats = AggregateStatistics::new();
        let rec = parse_line(
            Dialect::Application,
            "[2024-01-15 10:30:00] INFO: rendering <script>alert(1)</script>",
        )
        .unwrap();
        let alerts = run(&mut det, &mut stats, &rec);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::SuspiciousRequest);
        assert!(alerts[0].message.contains("xss_script_tag"));
    }

    #[test]
    fn blacklisted_addresses_are_sorted() {
        let mut det = detector(1);
        let mut stats = AggregateStatistics::new();
        for addr in ["10.0.0.3", "10.0.0.1", "10.0.0.2"] {
            run(&mut det, &mut stats, &web(addr, "/", 403));
        }
        assert_eq!(
            det.blacklisted_addresses(),
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
    }
}
