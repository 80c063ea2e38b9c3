//! 형식 trait 및 canonical ID
//!
//! [`Format`]은 SBOM 문서 형식 하나의 능력을 묶는 trait입니다.
//! 모든 구현체는 빈 입력이나 잘린 입력에 대해 panic 없이 에러를
//! 반환해야 하며, `identify`는 그런 입력에 false를 돌려줍니다.

use std::fmt;
use std::io::Write;

use packhorse_core::error::FormatError;
use packhorse_core::types::Sbom;

/// 지원 형식의 canonical ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatId {
    /// 네이티브 무손실 JSON
    PackhorseJson,
    /// CycloneDX 1.5 JSON
    CycloneDxJson,
    /// CycloneDX 1.5 XML
    CycloneDxXml,
    /// SPDX 2.3 JSON
    SpdxJson,
    /// SPDX 2.3 tag-value 텍스트
    SpdxTagValue,
    /// 표시 전용 텍스트 테이블
    Table,
}

impl FormatId {
    /// canonical ID 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PackhorseJson => "packhorse-json",
            Self::CycloneDxJson => "cyclonedx-json",
            Self::CycloneDxXml => "cyclonedx-xml",
            Self::SpdxJson => "spdx-json",
            Self::SpdxTagValue => "spdx-tag-value",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SBOM 문서 형식
///
/// 구현체는 상태를 갖지 않으며 레지스트리가 소유합니다.
pub trait Format: Send + Sync {
    /// canonical ID
    fn id(&self) -> FormatId;

    /// 이름 조회에 쓰이는 별칭 목록 (canonical ID는 항상 포함됨)
    fn aliases(&self) -> &'static [&'static str];

    /// 입력이 이 형식의 문서인지 내용으로 판별합니다.
    ///
    /// 판별 불가 입력(빈 입력 포함)에는 false를 반환합니다.
    fn identify(&self, input: &[u8]) -> bool;

    /// 문서를 정준 모델로 디코드합니다.
    fn decode(&self, input: &[u8]) -> Result<Sbom, FormatError>;

    /// 정준 모델을 이 형식으로 인코드합니다.
    fn encode(&self, sbom: &Sbom, out: &mut dyn Write) -> Result<(), FormatError>;

    /// 문서의 심층 유효성을 검증합니다.
    ///
    /// 기본 구현은 디코드 성공 여부로 판단합니다.
    fn validate(&self, input: &[u8]) -> Result<(), FormatError> {
        self.decode(input).map(|_| ())
    }
}
