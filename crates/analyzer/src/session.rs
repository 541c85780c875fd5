//! 분석 세션 -- 라인 단위 파이프라인과 세션 상태를 소유합니다.
//!
//! [`AnalysisSession`]은 방언, 통계, 알림 목록, 탐지기(블랙리스트 포함),
//! 알림 발생률 윈도우를 단독으로 소유합니다. 배치 모드와 모니터 모드는
//! 같은 라인 파이프라인을 사용합니다.
//!
//! ```text
//! raw line -> parse -> stats.update -> detector.evaluate -> alerts
//!                                                   (monitor) -> rate window check
//! ```
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logwarden_analyzer::AnalyzerError> {
//! use logwarden_analyzer::{AnalysisSessionBuilder, Dialect};
//!
//! let mut session = AnalysisSessionBuilder::new()
//!     .dialect(Dialect::Nginx)
//!     .error_threshold(10)
//!     .build()?;
//! let report = session.analyze_file("/var/log/nginx/access.log").await?;
//! println!("{} records", report.total_records);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::io::AsyncBufRead;

use logwarden_core::metrics as m;

use crate::alert::{Alert, AlertRateWindow, AlertType};
use crate::config::AnalyzerConfig;
use crate::detector::{DEFAULT_ERROR_THRESHOLD, SecurityDetector};
use crate::dialect::Dialect;
use crate::error::AnalyzerError;
use crate::export::ExportDocument;
use crate::parser::parse_line;
use crate::pattern::PatternSet;
use crate::report::AnalysisReport;
use crate::source::{FileSource, LineReader};
use crate::stats::AggregateStatistics;

/// 기본 알림 발생률 임계값
pub const DEFAULT_HIGH_ALERT_THRESHOLD: usize = 5;
/// 기본 알림 발생률 윈도우
pub const DEFAULT_ALERT_WINDOW: Duration = Duration::from_secs(60);

/// 라인 하나의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// 레코드로 파싱되어 반영됨 (발생한 알림 수)
    Parsed {
        /// 이 라인에서 발생한 알림 수
        alerts: usize,
    },
    /// 방언에 매칭되지 않아 건너뜀
    Skipped,
}

/// 분석 세션
#[derive(Debug)]
pub struct AnalysisSession {
    dialect: Dialect,
    stats: AggregateStatistics,
    alerts: Vec<Alert>,
    detector: SecurityDetector,
    rate_window: AlertRateWindow,
    top_n: usize,
    hourly_window: usize,
    started_at: Instant,
    finished_at: Option<Instant>,
}

impl AnalysisSession {
    /// 분석 엔진 설정으로 세션을 생성합니다.
    ///
    /// `patterns_file`이 지정되어 있으면 패턴을 파일에서 로드합니다.
    pub async fn from_config(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;

        let patterns = match &config.patterns_file {
            Some(path) => PatternSet::load_file(path).await?,
            None => PatternSet::default(),
        };

        AnalysisSessionBuilder::new()
            .dialect(config.dialect)
            .patterns(patterns)
            .error_threshold(config.error_threshold)
            .high_alert_threshold(config.high_alert_threshold)
            .alert_window(config.alert_window())
            .top_n(config.top_n)
            .hourly_window(config.hourly_window)
            .build()
    }

    /// 원시 라인 하나를 파이프라인에 통과시킵니다.
    ///
    /// 파싱에 실패한 라인은 경고 로그를 남기고 건너뜀으로 집계되며,
    /// 세션은 계속 사용할 수 있습니다.
    pub fn process_line(&mut self, raw_line: &str, line_number: Option<u64>) -> LineOutcome {
        let dialect = self.dialect.name();
        metrics::counter!(m::LINES_READ_TOTAL, m::LABEL_DIALECT => dialect).increment(1);

        let record = match parse_line(self.dialect, raw_line) {
            Ok(record) => record,
            Err(skip) => {
                self.stats.record_skip();
                metrics::counter!(m::LINES_SKIPPED_TOTAL, m::LABEL_DIALECT => dialect)
                    .increment(1);
                tracing::warn!(line = line_number, reason = %skip.reason, "skipping unparseable line");
                return LineOutcome::Skipped;
            }
        };
        let record = match line_number {
            Some(n) => record.with_line_number(n),
            None => record,
        };
        metrics::counter!(m::RECORDS_PARSED_TOTAL, m::LABEL_DIALECT => dialect).increment(1);

        self.stats.update(&record);
        let new_alerts = self.detector.evaluate(&record, &mut self.stats);
        let count = new_alerts.len();
        for alert in new_alerts {
            self.push_alert(alert);
        }

        LineOutcome::Parsed { alerts: count }
    }

    /// 모니터 모드 라인 처리: 파이프라인 후 알림 발생률 윈도우를 검사합니다.
    pub fn process_streaming_line(&mut self, raw_line: &str, now: DateTime<Utc>) -> LineOutcome {
        let first_new = self.alerts.len();
        let outcome = self.process_line(raw_line, None);
        for alert in &self.alerts[first_new..] {
            self.rate_window.record(alert);
        }
        self.check_alert_rate(now);
        outcome
    }

    /// 슬라이딩 윈도우 검사를 수행하고, 발생한 `HighAlertRate` 알림을 반환합니다.
    pub fn check_alert_rate(&mut self, now: DateTime<Utc>) -> Option<&Alert> {
        let meta = self.rate_window.check(now)?;
        tracing::warn!(detail = %meta.message, "high alert rate");
        self.rate_window.record(&meta);
        self.push_alert(meta);
        self.alerts.last()
    }

    fn push_alert(&mut self, alert: Alert) {
        metrics::counter!(m::ALERTS_TOTAL, m::LABEL_ALERT_TYPE => alert.alert_type.as_str())
            .increment(1);
        if alert.alert_type == AlertType::IpBlacklisted {
            metrics::counter!(m::ADDRESSES_BLACKLISTED_TOTAL).increment(1);
        }
        self.alerts.push(alert);
    }

    /// 파일 전체를 배치 분석합니다.
    ///
    /// # Errors
    /// 파일을 열 수 없으면 처리 시작 전에 `SourceUnavailable`을 반환합니다.
    pub async fn analyze_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<AnalysisReport, AnalyzerError> {
        let path = path.as_ref();
        let mut source = FileSource::open(path).await?;
        tracing::info!(path = %path.display(), dialect = %self.dialect, "batch analysis started");
        self.consume(source.lines_mut()).await
    }

    /// 임의의 비동기 리더를 끝까지 배치 분석합니다.
    pub async fn analyze_reader<R>(&mut self, reader: R) -> Result<AnalysisReport, AnalyzerError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.consume(&mut LineReader::new(reader)).await
    }

    async fn consume<R>(&mut self, lines: &mut LineReader<R>) -> Result<AnalysisReport, AnalyzerError>
    where
        R: AsyncBufRead + Unpin,
    {
        let run_started = Instant::now();
        let mut line_number = 0_u64;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            self.process_line(&line, Some(line_number));
        }
        if let Some(last) = lines.take_remainder() {
            line_number += 1;
            self.process_line(&last, Some(line_number));
        }

        self.finish();
        metrics::histogram!(m::RUN_DURATION_SECONDS, m::LABEL_MODE => "batch")
            .record(run_started.elapsed().as_secs_f64());
        tracing::info!(
            lines = line_number,
            records = self.stats.total_record_count,
            skipped = self.stats.skipped_line_count,
            alerts = self.alerts.len(),
            "batch analysis finished"
        );

        Ok(self.report())
    }

    /// 실행 종료 시각을 기록합니다.
    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    /// 현재 상태의 리포트를 만듭니다.
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport::from_session(self)
    }

    /// 현재 상태의 내보내기 문서를 만듭니다.
    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::from_session(self)
    }

    /// 방언
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// 누적 통계
    pub fn statistics(&self) -> &AggregateStatistics {
        &self.stats
    }

    /// 생성 순서대로의 알림 목록
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// 보안 탐지기 (블랙리스트 포함)
    pub fn detector(&self) -> &SecurityDetector {
        &self.detector
    }

    /// 리포트 상위 항목 수
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// 리포트 최근 시간대 버킷 수
    pub fn hourly_window(&self) -> usize {
        self.hourly_window
    }

    /// 세션 생성부터 실행 종료(진행 중이면 현재)까지의 경과 시간
    pub fn elapsed(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.started_at)
    }
}

/// 분석 세션 빌더
pub struct AnalysisSessionBuilder {
    dialect: Dialect,
    patterns: Option<PatternSet>,
    error_threshold: u64,
    high_alert_threshold: usize,
    alert_window: Duration,
    top_n: usize,
    hourly_window: usize,
}

impl AnalysisSessionBuilder {
    /// 기본값으로 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            dialect: Dialect::default(),
            patterns: None,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            high_alert_threshold: DEFAULT_HIGH_ALERT_THRESHOLD,
            alert_window: DEFAULT_ALERT_WINDOW,
            top_n: 10,
            hourly_window: 24,
        }
    }

    /// 방언을 설정합니다.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// 의심 패턴 세트를 설정합니다 (기본: [`PatternSet::default`]).
    pub fn patterns(mut self, patterns: PatternSet) -> Self {
        self.patterns = Some(patterns);
        self
    }

    /// 주소별 에러 임계값을 설정합니다.
    pub fn error_threshold(mut self, threshold: u64) -> Self {
        self.error_threshold = threshold;
        self
    }

    /// 알림 발생률 임계값을 설정합니다.
    pub fn high_alert_threshold(mut self, threshold: usize) -> Self {
        self.high_alert_threshold = threshold;
        self
    }

    /// 알림 발생률 윈도우를 설정합니다.
    pub fn alert_window(mut self, window: Duration) -> Self {
        self.alert_window = window;
        self
    }

    /// 리포트 상위 항목 수를 설정합니다.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    /// 리포트 시간대 버킷 수를 설정합니다.
    pub fn hourly_window(mut self, n: usize) -> Self {
        self.hourly_window = n;
        self
    }

    /// 세션을 생성합니다.
    ///
    /// # Errors
    /// 에러 임계값이나 윈도우가 0인 경우
    pub fn build(self) -> Result<AnalysisSession, AnalyzerError> {
        if self.error_threshold == 0 {
            return Err(AnalyzerError::Config {
                field: "error_threshold".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.alert_window.is_zero() {
            return Err(AnalyzerError::Config {
                field: "alert_window".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let patterns = self.patterns.unwrap_or_default();
        tracing::debug!(
            dialect = %self.dialect,
            patterns = patterns.len(),
            error_threshold = self.error_threshold,
            "analysis session created"
        );

        Ok(AnalysisSession {
            dialect: self.dialect,
            stats: AggregateStatistics::new(),
            alerts: Vec::new(),
            detector: SecurityDetector::new(patterns, self.error_threshold),
            rate_window: AlertRateWindow::new(self.alert_window, self.high_alert_threshold),
            top_n: self.top_n,
            hourly_window: self.hourly_window,
            started_at: Instant::now(),
            finished_at: None,
        })
    }
}

impl Default for AnalysisSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
