//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `packhorse_`
//! - 모듈명: `catalog_`, `archive_`, `format_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(packhorse_core::metrics::CATALOG_PACKAGES_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 카탈로거 이름 레이블 키
pub const LABEL_CATALOGER: &str = "cataloger";

/// SBOM 형식 레이블 키 (canonical ID)
pub const LABEL_FORMAT: &str = "format";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Catalog 메트릭 ────────────────────────────────────────────────

/// Catalog: 발견된 패키지 수 (counter, label: cataloger)
pub const CATALOG_PACKAGES_TOTAL: &str = "packhorse_catalog_packages_total";

/// Catalog: 카탈로거 실패 수 (counter, label: cataloger)
pub const CATALOG_FAILURES_TOTAL: &str = "packhorse_catalog_failures_total";

// ─── Archive 메트릭 ────────────────────────────────────────────────

/// Archive: 처리된 아카이브 수 (counter)
pub const ARCHIVE_PROCESSED_TOTAL: &str = "packhorse_archive_processed_total";

/// Archive: 손상/비정형으로 건너뛴 아카이브 수 (counter)
pub const ARCHIVE_SKIPPED_TOTAL: &str = "packhorse_archive_skipped_total";

/// Archive: 재귀 깊이 한도로 중단된 중첩 아카이브 수 (counter)
pub const ARCHIVE_DEPTH_LIMITED_TOTAL: &str = "packhorse_archive_depth_limited_total";

/// Archive: 임시 작업 공간으로 추출된 엔트리 수 (counter)
pub const ARCHIVE_ENTRIES_EXTRACTED_TOTAL: &str = "packhorse_archive_entries_extracted_total";

// ─── Format 메트릭 ─────────────────────────────────────────────────

/// Format: 디코드 수 (counter, labels: format, result)
pub const FORMAT_DECODES_TOTAL: &str = "packhorse_format_decodes_total";

/// Format: 인코드 수 (counter, labels: format, result)
pub const FORMAT_ENCODES_TOTAL: &str = "packhorse_format_encodes_total";

/// Format: 변환 파이프라인 실행 수 (counter, label: result)
pub const FORMAT_CONVERSIONS_TOTAL: &str = "packhorse_format_conversions_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 CLI 진입점에서 호출합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    // Catalog
    describe_counter!(
        CATALOG_PACKAGES_TOTAL,
        "Total number of packages discovered, labelled by cataloger"
    );
    describe_counter!(
        CATALOG_FAILURES_TOTAL,
        "Total number of cataloger runs that failed"
    );

    // Archive
    describe_counter!(
        ARCHIVE_PROCESSED_TOTAL,
        "Total number of archives opened and catalogued"
    );
    describe_counter!(
        ARCHIVE_SKIPPED_TOTAL,
        "Total number of archives skipped as malformed or unsupported"
    );
    describe_counter!(
        ARCHIVE_DEPTH_LIMITED_TOTAL,
        "Total number of nested archives left unexplored due to the recursion budget"
    );
    describe_counter!(
        ARCHIVE_ENTRIES_EXTRACTED_TOTAL,
        "Total number of archive entries extracted into temporary workspaces"
    );

    // Format
    describe_counter!(
        FORMAT_DECODES_TOTAL,
        "Total number of SBOM document decode attempts, labelled by format and result"
    );
    describe_counter!(
        FORMAT_ENCODES_TOTAL,
        "Total number of SBOM document encode attempts, labelled by format and result"
    );
    describe_counter!(
        FORMAT_CONVERSIONS_TOTAL,
        "Total number of format conversion pipeline runs"
    );
}
