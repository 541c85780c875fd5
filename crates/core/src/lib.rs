//! logwarden 공통 크레이트
//!
//! 분석 엔진(`logwarden-analyzer`)과 CLI(`logwarden-cli`)가 공유하는
//! 에러 타입, 설정, 도메인 타입, 메트릭 이름을 정의합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: `logwarden.toml` 파싱 및 환경변수 오버라이드
//! - [`error`]: 최상위 에러 타입
//! - [`metrics`]: 메트릭 이름 상수 및 설명 등록
//! - [`types`]: 공통 도메인 타입 (로그 레벨)

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogwardenError, SourceError};

// 설정
pub use config::{AnalyzerSection, GeneralConfig, LogwardenConfig};

// 도메인 타입
pub use types::LogLevel;
