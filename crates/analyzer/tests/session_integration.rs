//! 통합 테스트 -- 배치 분석 전체 흐름 검증
//!
//! 파일/리더 입력부터 통계, 알림, 블랙리스트, 리포트, 내보내기 문서까지의
//! 흐름을 공개 API만으로 검증합니다.

use std::io::Write;
use std::path::PathBuf;

use logwarden_analyzer::{
    AlertType, AnalysisSession, AnalysisSessionBuilder, AnalyzerConfig, AnalyzerError, Dialect,
    ExportDocument, LineOutcome, PatternSet,
};

fn web_line(addr: &str, path: &str, status: u16) -> String {
    format!(r#"{addr} - - [10/Oct/2023:13:55:36 +0000] "GET {path} HTTP/1.1" {status} 512"#)
}

fn apache_session() -> AnalysisSession {
    AnalysisSessionBuilder::new()
        .dialect(Dialect::Apache)
        .build()
        .expect("default session must build")
}

fn write_log(lines: &[String]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// 같은 주소에서 10번째 에러 응답에 블랙리스트 알림 1건, 11번째에는 없음
#[test]
fn scenario_a_blacklist_is_edge_triggered() {
    let mut session = apache_session();
    let line = web_line("10.0.0.1", "/api/orders", 500);

    for n in 1..=9 {
        session.process_line(&line, Some(n));
        assert!(session.alerts().is_empty(), "no alert before threshold");
    }

    session.process_line(&line, Some(10));
    let blacklisted: Vec<_> = session
        .alerts()
        .iter()
        .filter(|a| a.alert_type == AlertType::IpBlacklisted)
        .collect();
    assert_eq!(blacklisted.len(), 1);
    assert_eq!(blacklisted[0].line_number, Some(10));
    assert!(blacklisted[0].message.contains("10.0.0.1"));

    session.process_line(&line, Some(11));
    assert_eq!(session.alerts().len(), 1, "no duplicate on the 11th error");
    assert_eq!(session.statistics().error_count_by_address["10.0.0.1"], 11);
    assert_eq!(session.detector().blacklisted_addresses(), vec!["10.0.0.1"]);
}

/// 디렉토리 순회 경로는 의심 요청 1건을 발생시키지만 레코드로는 정상 집계
#[test]
fn scenario_b_suspicious_record_still_counts() {
    let mut session = apache_session();
    let before = session.statistics().total_record_count;

    let outcome = session.process_line(&web_line("10.0.0.5", "/admin/../../../etc/passwd", 404), Some(1));

    assert_eq!(outcome, LineOutcome::Parsed { alerts: 1 });
    assert_eq!(session.alerts().len(), 1);
    assert_eq!(session.alerts()[0].alert_type, AlertType::SuspiciousRequest);
    assert_eq!(session.statistics().total_record_count, before + 1);
    assert_eq!(session.statistics().suspicious_request_count, 1);
}

/// 중간에 잘린 라인은 레코드/알림 없이 건너뛰고, 세션은 계속 사용 가능
#[test]
fn scenario_c_truncated_line_is_skipped() {
    let mut session = apache_session();
    let truncated = r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.ht"#;

    let before = session.statistics().clone();
    assert_eq!(session.process_line(truncated, Some(1)), LineOutcome::Skipped);

    let after = session.statistics();
    assert_eq!(after.total_record_count, before.total_record_count);
    assert_eq!(after.status_code_histogram, before.status_code_histogram);
    assert_eq!(after.skipped_line_count, 1);
    assert!(session.alerts().is_empty());

    session.process_line(&web_line("10.0.0.1", "/", 200), Some(2));
    assert_eq!(session.statistics().total_record_count, 1);
}

/// 레코드 3건, 알림 1건 세션의 내보내기 문서는 메모리 상태와 정확히 일치
#[test]
fn scenario_d_export_matches_memory() {
    let mut session = apache_session();
    session.process_line(&web_line("10.0.0.1", "/", 200), Some(1));
    session.process_line(&web_line("10.0.0.2", "/login", 401), Some(2));
    session.process_line(&web_line("10.0.0.3", "/x/../../etc/shadow", 404), Some(3));

    let doc = session.export_document();
    let stats = session.statistics();

    assert_eq!(doc.statistics.total_record_count, 3);
    assert_eq!(doc.alerts.len(), 1);
    assert_eq!(doc.alerts, session.alerts());
    assert_eq!(doc.dialect, Dialect::Apache);
    assert_eq!(
        doc.statistics.unique_source_address_count,
        stats.unique_source_addresses.len()
    );
    assert_eq!(
        doc.statistics.status_code_histogram.len(),
        stats.status_code_histogram.len()
    );
    for (status, count) in &stats.status_code_histogram {
        assert_eq!(doc.statistics.status_code_histogram[status], *count);
    }
    for (addr, count) in &stats.error_count_by_address {
        assert_eq!(doc.statistics.error_count_by_address[addr], *count);
    }
    assert_eq!(
        doc.statistics.bytes_transferred_total,
        stats.bytes_transferred_total
    );
    assert_eq!(doc.statistics.first_record_time, stats.first_record_time);

    let json = doc.to_json_pretty().unwrap();
    let parsed: ExportDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, doc);
}

/// 같은 입력을 새 세션 두 개에 넣으면 통계가 동일
#[tokio::test]
async fn batch_analysis_is_idempotent() {
    let lines = vec![
        web_line("10.0.0.1", "/", 200),
        web_line("10.0.0.2", "/missing", 404),
        "garbage line".to_owned(),
        web_line("10.0.0.2", "/search?q=1'+OR+'1'='1", 500),
    ];
    let file = write_log(&lines);

    let mut first = apache_session();
    let mut second = apache_session();
    let r1 = first.analyze_file(file.path()).await.unwrap();
    let r2 = second.analyze_file(file.path()).await.unwrap();

    assert_eq!(first.statistics(), second.statistics());
    assert_eq!(r1.total_records, r2.total_records);
    assert_eq!(r1.alert_counts, r2.alert_counts);
    assert_eq!(first.alerts().len(), second.alerts().len());
}

/// 주소별 에러 카운트는 라인이 처리될수록 감소하지 않음
#[test]
fn error_counts_are_monotonic() {
    let mut session = apache_session();
    let statuses = [500, 200, 404, 302, 503, 200, 400];
    let mut previous = 0;
    for (i, status) in statuses.iter().enumerate() {
        session.process_line(&web_line("10.0.0.7", "/", *status), Some(i as u64 + 1));
        let current = session
            .statistics()
            .error_count_by_address
            .get("10.0.0.7")
            .copied()
            .unwrap_or(0);
        assert!(current >= previous);
        previous = current;
    }
    assert_eq!(previous, 4);
}

/// 블랙리스트는 임계값에 도달한 주소만 포함
#[test]
fn blacklist_iff_threshold_reached() {
    let mut session = AnalysisSessionBuilder::new()
        .error_threshold(3)
        .build()
        .unwrap();
    for _ in 0..3 {
        session.process_line(&web_line("10.0.0.1", "/", 500), None);
    }
    for _ in 0..2 {
        session.process_line(&web_line("10.0.0.2", "/", 500), None);
    }

    let stats = session.statistics();
    for (addr, count) in &stats.error_count_by_address {
        assert_eq!(session.detector().is_blacklisted(addr), *count >= 3, "{addr}");
    }
}

#[tokio::test]
async fn missing_file_is_source_unavailable_before_processing() {
    let mut session = apache_session();
    let err = session
        .analyze_file("/nonexistent/dir/access.log")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::SourceUnavailable { .. }));
    assert_eq!(session.statistics().total_record_count, 0);
    assert_eq!(session.statistics().skipped_line_count, 0);
}

#[tokio::test]
async fn last_line_without_newline_is_processed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}\n{}",
        web_line("10.0.0.1", "/", 200),
        web_line("10.0.0.2", "/", 200)
    )
    .unwrap();
    file.flush().unwrap();

    let mut session = apache_session();
    let report = session.analyze_file(file.path()).await.unwrap();
    assert_eq!(report.total_records, 2);
}

#[tokio::test]
async fn application_log_raises_application_errors() {
    let input = "\
[2024-01-15 10:30:00] INFO: service started
[2024-01-15 10:31:00] ERROR: Database connection failed
[2024-01-15 10:32:00] CRITICAL: out of memory
this line does not match
[2024-01-15 11:00:00] WARNING: retrying
";
    let mut session = AnalysisSessionBuilder::new()
        .dialect(Dialect::Application)
        .build()
        .unwrap();
    let report = session.analyze_reader(input.as_bytes()).await.unwrap();

    assert_eq!(report.total_records, 4);
    assert_eq!(report.skipped_lines, 1);
    assert_eq!(report.alert_counts[&AlertType::ApplicationError], 2);
    assert_eq!(session.alerts()[0].line_number, Some(2));
    assert_eq!(session.alerts()[1].line_number, Some(3));
    assert_eq!(report.hourly_buckets.len(), 2);
}

#[tokio::test]
async fn shipped_pattern_file_loads() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("patterns/web-attacks.yml");
    let set = PatternSet::load_file(&path).await.unwrap();
    assert!(set.len() >= 4);

    let config = AnalyzerConfig {
        patterns_file: Some(path.display().to_string()),
        ..Default::default()
    };
    let mut session = AnalysisSession::from_config(&config).await.unwrap();
    session.process_line(&web_line("10.0.0.4", "/app/.env", 404), Some(1));
    assert_eq!(session.alerts().len(), 1);
    assert!(session.alerts()[0].message.contains("sensitive_file_probe"));
}

#[tokio::test]
async fn invalid_pattern_file_fails_session_creation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yml");
    tokio::fs::write(&path, "- name: broken\n  pattern: \"(unclosed\"\n")
        .await
        .unwrap();
    let config = AnalyzerConfig {
        patterns_file: Some(path.display().to_string()),
        ..Default::default()
    };
    let err = AnalysisSession::from_config(&config).await.unwrap_err();
    assert!(matches!(err, AnalyzerError::PatternValidation { .. }));
}
