//! 형식 간 변환 파이프라인
//!
//! 소스 형식으로 디코드한 정준 모델을 대상 형식으로 다시 인코드합니다.
//! 중간 표현이 정준 모델 하나뿐이므로 형식 쌍마다 별도 경로가 없습니다.

use std::io::Write;

use metrics::counter;
use tracing::info;

use packhorse_core::error::FormatError;
use packhorse_core::metrics::{
    FORMAT_CONVERSIONS_TOTAL, FORMAT_DECODES_TOTAL, FORMAT_ENCODES_TOTAL, LABEL_FORMAT,
    LABEL_RESULT,
};

use crate::format::Format;
use crate::registry::FormatRegistry;

/// 입력 문서를 대상 형식으로 변환합니다.
///
/// `target_name`은 레지스트리의 이름/별칭 조회 규칙을 따릅니다.
/// 디코드 실패와 인코드 실패는 서로 다른 에러 변형으로 전파됩니다.
pub fn convert(
    registry: &FormatRegistry,
    source: &dyn Format,
    input: &[u8],
    target_name: &str,
    out: &mut dyn Write,
) -> Result<(), FormatError> {
    let target = registry
        .by_name(target_name)
        .ok_or_else(|| FormatError::UnknownFormat {
            name: target_name.to_owned(),
        })?;

    let sbom = counted(FORMAT_DECODES_TOTAL, source.id().as_str(), || {
        source.decode(input)
    })?;
    counted(FORMAT_ENCODES_TOTAL, target.id().as_str(), || {
        target.encode(&sbom, out)
    })?;

    counter!(FORMAT_CONVERSIONS_TOTAL, LABEL_FORMAT => target.id().as_str()).increment(1);
    info!(
        source = %source.id(),
        target = %target.id(),
        packages = sbom.package_count(),
        "converted document"
    );
    Ok(())
}

/// 시도 결과를 success/failure 레이블로 집계합니다.
fn counted<T>(
    metric: &'static str,
    format: &'static str,
    op: impl FnOnce() -> Result<T, FormatError>,
) -> Result<T, FormatError> {
    let result = op();
    let outcome = if result.is_ok() { "success" } else { "failure" };
    counter!(metric, LABEL_FORMAT => format, LABEL_RESULT => outcome).increment(1);
    result
}
