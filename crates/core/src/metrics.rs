//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 분석 엔진은 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//! 레코더가 설치되지 않으면 매크로 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logwarden_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logwarden_core::metrics::RECORDS_PARSED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 알림 유형 레이블 키 (suspicious_request, ip_blacklisted, ...)
pub const LABEL_ALERT_TYPE: &str = "type";

/// 방언 레이블 키 (apache, nginx, application, generic)
pub const LABEL_DIALECT: &str = "dialect";

/// 실행 모드 레이블 키 (batch, monitor)
pub const LABEL_MODE: &str = "mode";

// ─── 분석 엔진 메트릭 ──────────────────────────────────────────────

/// 읽은 원시 라인 수 (counter, label: dialect)
pub const LINES_READ_TOTAL: &str = "logwarden_lines_read_total";

/// 파싱에 성공한 레코드 수 (counter, label: dialect)
pub const RECORDS_PARSED_TOTAL: &str = "logwarden_records_parsed_total";

/// 건너뛴 라인 수 (counter, label: dialect)
pub const LINES_SKIPPED_TOTAL: &str = "logwarden_lines_skipped_total";

/// 생성된 알림 수 (counter, label: type)
pub const ALERTS_TOTAL: &str = "logwarden_alerts_total";

/// 블랙리스트에 추가된 주소 수 (counter)
pub const ADDRESSES_BLACKLISTED_TOTAL: &str = "logwarden_addresses_blacklisted_total";

/// 분석 실행 소요 시간 (histogram, 초, label: mode)
pub const RUN_DURATION_SECONDS: &str = "logwarden_run_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 바이너리 시작 시 한 번 호출합니다. 레코더가 없으면 아무 동작도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        LINES_READ_TOTAL,
        "Total number of raw lines read from log sources"
    );
    describe_counter!(
        RECORDS_PARSED_TOTAL,
        "Total number of lines successfully parsed into records"
    );
    describe_counter!(
        LINES_SKIPPED_TOTAL,
        "Total number of lines skipped because they did not match the active dialect"
    );
    describe_counter!(ALERTS_TOTAL, "Total number of alerts raised, by alert type");
    describe_counter!(
        ADDRESSES_BLACKLISTED_TOTAL,
        "Total number of source addresses added to the blacklist"
    );
    describe_histogram!(
        RUN_DURATION_SECONDS,
        "Wall-clock duration of a batch or monitor run in seconds"
    );
}
