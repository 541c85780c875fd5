//! 모니터 모드 -- 증가하는 로그 파일을 `tail -f`처럼 따라가며 분석합니다.
//!
//! [`start_monitor`]는 파일을 끝에서 열고 호출자 런타임에 협력적 태스크 하나를
//! 띄웁니다. 루프는 새 라인이 있으면 파이프라인과 알림 발생률 검사를 수행하고,
//! 없으면 폴링 주기만큼 쉬거나 취소 시 즉시 깨어납니다.
//!
//! 취소는 에러가 아닙니다. 어떤 경로로 루프가 끝나든 파일 핸들을 놓고
//! 그 시점까지의 상태로 최종 리포트를 만듭니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logwarden_analyzer::AnalyzerError> {
//! use std::time::Duration;
//! use logwarden_analyzer::{AnalysisSessionBuilder, monitor::start_monitor};
//!
//! let session = AnalysisSessionBuilder::new().build()?;
//! let handle = start_monitor(session, "/var/log/apache2/access.log", Duration::from_secs(1)).await?;
//!
//! tokio::signal::ctrl_c().await?;
//! handle.cancel();
//! let outcome = handle.join().await?;
//! println!("{} records", outcome.report.total_records);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use logwarden_core::metrics as m;

use crate::error::AnalyzerError;
use crate::report::AnalysisReport;
use crate::session::AnalysisSession;
use crate::source::FileSource;

/// 기본 폴링 주기
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// 모니터 루프 종료 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// 외부 취소
    Cancelled,
    /// 소스 읽기 실패
    SourceError(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::SourceError(reason) => write!(f, "source error: {reason}"),
        }
    }
}

/// 모니터 종료 결과
#[derive(Debug)]
pub struct MonitorOutcome {
    /// 누적 상태를 가진 세션 (내보내기 등에 사용)
    pub session: AnalysisSession,
    /// 최종 리포트
    pub report: AnalysisReport,
    /// 종료 사유
    pub stop_reason: StopReason,
}

/// 실행 중인 모니터 핸들
///
/// 핸들을 버리면 모니터도 취소됩니다.
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<MonitorOutcome>,
    _guard: DropGuard,
}

impl MonitorHandle {
    /// 모니터에 종료를 요청합니다. 여러 번 호출해도 안전합니다.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 종료 요청 여부
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 외부에서 취소를 연결할 수 있는 토큰 사본
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 모니터 태스크가 끝날 때까지 기다립니다.
    ///
    /// # Errors
    /// 태스크가 패닉하거나 런타임에 의해 중단된 경우
    pub async fn join(self) -> Result<MonitorOutcome, AnalyzerError> {
        self.task
            .await
            .map_err(|e| AnalyzerError::MonitorTask(e.to_string()))
    }

    /// 종료를 요청하고 결과를 기다립니다.
    pub async fn shutdown(self) -> Result<MonitorOutcome, AnalyzerError> {
        self.cancel();
        self.join().await
    }
}

/// 파일 모니터링을 시작합니다.
///
/// 파일은 현재 끝에서부터 읽으므로 기존 내용은 분석하지 않습니다.
///
/// # Errors
/// - 파일을 열 수 없으면 태스크를 띄우기 전에 `SourceUnavailable`
/// - 폴링 주기가 0이면 `Config`
pub async fn start_monitor(
    session: AnalysisSession,
    path: impl AsRef<Path>,
    poll_interval: Duration,
) -> Result<MonitorHandle, AnalyzerError> {
    if poll_interval.is_zero() {
        return Err(AnalyzerError::Config {
            field: "poll_interval".to_owned(),
            reason: "must be greater than 0".to_owned(),
        });
    }

    let source = FileSource::open_at_end(path).await?;
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_monitor(session, source, poll_interval, cancel.clone()));

    Ok(MonitorHandle {
        _guard: cancel.clone().drop_guard(),
        cancel,
        task,
    })
}

async fn run_monitor(
    mut session: AnalysisSession,
    mut source: FileSource,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> MonitorOutcome {
    let run_started = Instant::now();
    let mut truncation_warned = false;

    tracing::info!(
        path = %source.path().display(),
        dialect = %session.dialect(),
        poll_interval_ms = poll_interval.as_millis() as u64,
        "monitor started"
    );

    let stop_reason = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }

        match source.next_line().await {
            Ok(Some(line)) => {
                session.process_streaming_line(&line, Utc::now());
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(path = %source.path().display(), error = %e, "failed to read source");
                break StopReason::SourceError(e.to_string());
            }
        }

        if !truncation_warned {
            match source.is_truncated().await {
                Ok(true) => {
                    tracing::warn!(
                        path = %source.path().display(),
                        position = source.position(),
                        "source file shrank (truncated or rotated); new data may be missed"
                    );
                    truncation_warned = true;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!(error = %e, "failed to stat source"),
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = cancel.cancelled() => break StopReason::Cancelled,
        }
    };

    let pending = source.pending_len();
    if pending > 0 {
        tracing::debug!(bytes = pending, "discarding incomplete trailing line");
    }
    let path = source.path().display().to_string();
    drop(source);

    session.finish();
    metrics::histogram!(m::RUN_DURATION_SECONDS, m::LABEL_MODE => "monitor")
        .record(run_started.elapsed().as_secs_f64());

    let report = session.report();
    tracing::info!(
        path = %path,
        reason = %stop_reason,
        records = report.total_records,
        alerts = report.total_alerts(),
        "monitor stopped"
    );

    MonitorOutcome {
        session,
        report,
        stop_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AnalysisSessionBuilder;
    use std::io::Write;

    fn session() -> AnalysisSession {
        AnalysisSessionBuilder::new().build().unwrap()
    }

    #[tokio::test]
    async fn missing_file_fails_before_spawning() {
        let err = start_monitor(session(), "/nonexistent/access.log", DEFAULT_POLL_INTERVAL)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn zero_poll_interval_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = start_monitor(session(), file.path(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Config { .. }));
    }

    #[tokio::test]
    async fn existing_content_is_not_analyzed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET / HTTP/1.1" 200 1"#
        )
        .unwrap();
        file.flush().unwrap();

        let handle = start_monitor(session(), file.path(), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let outcome = handle.shutdown().await.unwrap();
        assert_eq!(outcome.report.total_records, 0);
        assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_observable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let handle = start_monitor(session(), file.path(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!handle.is_cancelled());
        let token = handle.cancellation_token();
        token.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        // 60초 폴링 중이어도 취소 즉시 종료
        let outcome = tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    }

    #[tokio::test]
    async fn dropping_handle_cancels_monitor() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let handle = start_monitor(session(), file.path(), Duration::from_secs(60))
            .await
            .unwrap();
        let token = handle.cancellation_token();
        assert!(!token.is_cancelled());

        drop(handle);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(token.is_cancelled());
    }
}
