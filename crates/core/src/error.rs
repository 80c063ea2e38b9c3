//! 에러 타입 — 도메인별 에러 정의
//!
//! [`PackhorseError`]는 최상위 에러 타입이며, 각 도메인 에러는
//! `From` 구현을 통해 `?` 연산자로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **아카이브**: `MalformedArchive`, `CorruptManifest`, `ExtractionFailed`
//! - **형식 변환**: `UnknownFormat`, `DecodeFailed`, `EncodeFailed`, `ValidationFailed`
//! - **설정**: `FileNotFound`, `ParseFailed`, `InvalidValue`

/// Packhorse 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum PackhorseError {
    /// 아카이브 처리 에러
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// SBOM 형식 에러
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 카탈로깅 실패
    #[error("catalog error: {0}")]
    Catalog(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 아카이브 처리 에러
///
/// zip 계열 컨테이너의 탐지, 매니페스트 파싱, 임시 추출 단계에서
/// 발생하는 에러를 나타냅니다.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// EOCD 레코드를 찾을 수 없거나 페이로드 구조가 올바르지 않음
    #[error("malformed archive: {reason}")]
    MalformedArchive {
        /// 실패 사유
        reason: String,
    },

    /// 중앙 디렉토리 레코드가 스트림 경계를 벗어나거나 일관성이 없음
    #[error("corrupt manifest at offset {offset}: {reason}")]
    CorruptManifest {
        /// 문제가 된 레코드의 절대 오프셋
        offset: u64,
        /// 실패 사유
        reason: String,
    },

    /// 임시 작업 공간으로의 추출 실패
    #[error("extraction failed: {path}: {source}")]
    ExtractionFailed {
        /// 추출 대상 엔트리 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

/// SBOM 형식 에러
///
/// 형식 레지스트리 조회와 디코딩/인코딩 파이프라인의 에러를 나타냅니다.
/// 디코드와 인코드 실패는 호출자가 어느 쪽이 깨졌는지 구분할 수 있도록
/// 별도 변형으로 유지합니다.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// 이름/별칭 조회 실패 (사용자 입력 오류)
    #[error("unknown format name: '{name}'")]
    UnknownFormat {
        /// 조회에 사용된 원본 이름
        name: String,
    },

    /// 소스 형식 디코딩 실패
    #[error("decode failed ({format}): {reason}")]
    DecodeFailed {
        /// 형식 canonical ID
        format: String,
        /// 실패 사유
        reason: String,
    },

    /// 대상 형식 인코딩 실패
    #[error("encode failed ({format}): {reason}")]
    EncodeFailed {
        /// 형식 canonical ID
        format: String,
        /// 실패 사유
        reason: String,
    },

    /// 심층 스키마 검증 실패
    #[error("validation failed ({format}): {reason}")]
    ValidationFailed {
        /// 형식 canonical ID
        format: String,
        /// 실패 사유
        reason: String,
    },
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
