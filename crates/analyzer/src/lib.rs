//! logwarden 분석 엔진
//!
//! 웹 서버/애플리케이션 로그 라인을 방언(dialect)에 따라 레코드로 파싱하고,
//! 누적 통계를 갱신하며, 보안 관련 패턴을 탐지하여 리포트와 JSON 문서를 만듭니다.
//!
//! # 모듈 구성
//!
//! - [`dialect`]: 로그 형식 레지스트리 (apache, nginx, application, generic)
//! - [`parser`]: 라인 하나를 [`Record`] 또는 건너뜀으로 변환
//! - [`stats`]: 세션 누적 통계
//! - [`pattern`]: 의심 패턴 세트 (기본 세트 + YAML 로딩)
//! - [`alert`]: 알림 타입과 알림 발생률 윈도우
//! - [`detector`]: 의심 패턴, 에러 임계값/블랙리스트, 애플리케이션 에러 검사
//! - [`source`]: 부분 라인 버퍼링을 지원하는 라인 리더
//! - [`session`]: 세션 상태와 배치 분석
//! - [`monitor`]: 증가하는 파일을 따라가는 모니터 모드
//! - [`report`], [`export`]: 텍스트 리포트와 구조화 문서
//! - [`config`]: 분석 엔진 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! FileSource -> parse_line -> AggregateStatistics -> SecurityDetector -> alerts
//!  (batch/monitor)  (Dialect)      (update)           (evaluate)      (rate window: monitor)
//!                                                                          |
//!                                                     AnalysisReport / ExportDocument
//! ```

pub mod alert;
pub mod config;
pub mod detector;
pub mod dialect;
pub mod error;
pub mod export;
pub mod monitor;
pub mod parser;
pub mod pattern;
pub mod report;
pub mod session;
pub mod source;
pub mod stats;

// --- 주요 타입 re-export ---

// 세션
pub use session::{AnalysisSession, AnalysisSessionBuilder, LineOutcome};

// 모니터
pub use monitor::{MonitorHandle, MonitorOutcome, StopReason, start_monitor};

// 설정
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};

// 에러
pub use error::AnalyzerError;

// 파싱
pub use dialect::Dialect;
pub use parser::{ParseSkip, Record, SkipReason};

// 탐지
pub use alert::{Alert, AlertType};
pub use detector::SecurityDetector;
pub use pattern::{PatternDefinition, PatternSet, SuspiciousPattern};

// 결과
pub use export::ExportDocument;
pub use report::AnalysisReport;
pub use stats::AggregateStatistics;
