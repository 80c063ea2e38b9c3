//! 형식 레지스트리
//!
//! 지원 형식의 고정 집합을 등록 순서대로 보관합니다. 내용 기반 판별은
//! 등록 순서를 우선순위로 쓰고, 이름 조회는 구분자와 숫자를 무시하는
//! 정규화 규칙을 적용합니다.

use tracing::debug;

use crate::format::Format;
use crate::formats::{
    CycloneDxJsonFormat, CycloneDxXmlFormat, PackhorseJsonFormat, SpdxJsonFormat,
    SpdxTagValueFormat, TableFormat,
};

/// 지원 형식의 고정 집합
///
/// 등록 순서가 곧 [`identify`](FormatRegistry::identify)의 우선순위입니다.
/// 네이티브 형식이 가장 앞이라서 자기 출력은 항상 자신으로 판별됩니다.
pub struct FormatRegistry {
    formats: Vec<Box<dyn Format>>,
}

impl FormatRegistry {
    /// 지원하는 모든 형식이 등록된 레지스트리를 만듭니다.
    pub fn new() -> Self {
        Self {
            formats: vec![
                Box::new(PackhorseJsonFormat),
                Box::new(CycloneDxJsonFormat),
                Box::new(CycloneDxXmlFormat),
                Box::new(SpdxJsonFormat),
                Box::new(SpdxTagValueFormat),
                Box::new(TableFormat),
            ],
        }
    }

    /// 등록된 형식을 등록 순서대로 돌려줍니다.
    pub fn formats(&self) -> impl Iterator<Item = &dyn Format> {
        self.formats.iter().map(Box::as_ref)
    }

    /// 이름 또는 별칭으로 형식을 찾습니다.
    ///
    /// 조회 전에 양쪽 모두 [`normalize`]를 거치므로 `spdx-json`,
    /// `SPDX_JSON`, `spdxjson`, `spdx-2-json`은 같은 형식을 돌려줍니다.
    pub fn by_name(&self, name: &str) -> Option<&dyn Format> {
        let wanted = normalize(name);
        if wanted.is_empty() {
            return None;
        }
        self.formats().find(|f| {
            normalize(f.id().as_str()) == wanted
                || f.aliases().iter().any(|a| normalize(a) == wanted)
        })
    }

    /// 입력 바이트를 내용으로 판별합니다.
    ///
    /// 등록 순서대로 [`Format::identify`]를 호출해 처음 참을 돌려준
    /// 형식을 택합니다.
    pub fn identify(&self, input: &[u8]) -> Option<&dyn Format> {
        let found = self.formats().find(|f| f.identify(input));
        if let Some(format) = found {
            debug!(format = %format.id(), "identified input format");
        }
        found
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 이름 조회용 정규화: 소문자화 후 구분자(`-`, `_`, `.`, 공백)와
/// ASCII 숫자를 제거합니다.
///
/// 버전 표기 차이(`spdx-2-json` vs `spdx-json`)와 구분자 취향 차이를
/// 흡수하기 위한 규칙입니다.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | '.' | ' ') && !c.is_ascii_digit())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
