//! 구조화 내보내기 문서
//!
//! [`ExportDocument`]는 세션의 통계, 알림, 블랙리스트를 그대로 담은
//! JSON 문서입니다. 모든 맵은 키 순서로 정렬되어 출력이 결정적입니다.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use logwarden_core::types::LogLevel;

use crate::alert::Alert;
use crate::dialect::Dialect;
use crate::error::AnalyzerError;
use crate::session::AnalysisSession;
use crate::stats::AggregateStatistics;

/// 내보내기 통계 섹션
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStatistics {
    /// 파싱된 레코드 총 수
    pub total_record_count: u64,
    /// 고유 출발지 주소 수
    pub unique_source_address_count: usize,
    /// 상태 코드별 횟수
    pub status_code_histogram: BTreeMap<u16, u64>,
    /// HTTP 메서드별 횟수
    pub method_histogram: BTreeMap<String, u64>,
    /// 경로별 횟수
    pub path_histogram: BTreeMap<String, u64>,
    /// `YYYY-MM-DD HH:00` 버킷별 횟수
    pub hourly_bucket_histogram: BTreeMap<String, u64>,
    /// 전송 바이트 합계
    pub bytes_transferred_total: u64,
    /// 주소별 에러 응답 수
    pub error_count_by_address: BTreeMap<String, u64>,
    /// 가장 이른 레코드 시각 (없으면 null)
    pub first_record_time: Option<DateTime<FixedOffset>>,
    /// 가장 늦은 레코드 시각 (없으면 null)
    pub last_record_time: Option<DateTime<FixedOffset>>,
    /// 로그 레벨별 횟수
    pub severity_histogram: BTreeMap<LogLevel, u64>,
    /// 건너뛴 라인 수
    pub skipped_line_count: u64,
    /// 의심 요청 수
    pub suspicious_request_count: u64,
}

impl From<&AggregateStatistics> for ExportStatistics {
    fn from(stats: &AggregateStatistics) -> Self {
        Self {
            total_record_count: stats.total_record_count,
            unique_source_address_count: stats.unique_source_address_count(),
            status_code_histogram: sorted(&stats.status_code_histogram),
            method_histogram: sorted(&stats.method_histogram),
            path_histogram: sorted(&stats.path_histogram),
            hourly_bucket_histogram: sorted(&stats.hourly_bucket_histogram),
            bytes_transferred_total: stats.bytes_transferred_total,
            error_count_by_address: sorted(&stats.error_count_by_address),
            first_record_time: stats.first_record_time,
            last_record_time: stats.last_record_time,
            severity_histogram: sorted(&stats.severity_histogram),
            skipped_line_count: stats.skipped_line_count,
            suspicious_request_count: stats.suspicious_request_count,
        }
    }
}

fn sorted<K: Ord + Clone>(map: &std::collections::HashMap<K, u64>) -> BTreeMap<K, u64> {
    map.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

/// 내보내기 문서
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// 문서 생성 시각
    pub analysis_timestamp: DateTime<Utc>,
    /// 방언
    pub dialect: Dialect,
    /// 통계
    pub statistics: ExportStatistics,
    /// 생성 순서대로의 알림 목록
    pub alerts: Vec<Alert>,
    /// 블랙리스트 주소 (정렬됨)
    pub blacklisted_addresses: Vec<String>,
}

impl ExportDocument {
    /// 세션 상태로 문서를 만듭니다.
    pub fn from_session(session: &AnalysisSession) -> Self {
        Self {
            analysis_timestamp: Utc::now(),
            dialect: session.dialect(),
            statistics: ExportStatistics::from(session.statistics()),
            alerts: session.alerts().to_vec(),
            blacklisted_addresses: session.detector().blacklisted_addresses(),
        }
    }

    /// 들여쓰기된 JSON 문자열로 직렬화합니다.
    pub fn to_json_pretty(&self) -> Result<String, AnalyzerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON 파일로 저장합니다.
    pub async fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AnalyzerError> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        tokio::fs::write(path, json).await.map_err(|e| {
            AnalyzerError::Export(format!("failed to write {}: {e}", path.display()))
        })?;
        tracing::info!(
            path = %path.display(),
            alerts = self.alerts.len(),
            "exported analysis document"
        );
        Ok(())
    }
}
