//! 사람용 테이블 출력
//!
//! 터미널 확인용 표시 전용 형식입니다. 디코드와 검증은 지원하지 않고
//! 내용 기반 판별에도 참여하지 않습니다.

use std::io::Write;

use packhorse_core::error::FormatError;
use packhorse_core::types::Sbom;

use crate::format::{Format, FormatId};

/// 표시 전용 테이블 형식
pub struct TableFormat;

impl Format for TableFormat {
    fn id(&self) -> FormatId {
        FormatId::Table
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["table", "text"]
    }

    fn identify(&self, _input: &[u8]) -> bool {
        false
    }

    fn decode(&self, _input: &[u8]) -> Result<Sbom, FormatError> {
        Err(FormatError::DecodeFailed {
            format: self.id().as_str().to_owned(),
            reason: "table is a display-only format".to_owned(),
        })
    }

    fn encode(&self, sbom: &Sbom, out: &mut dyn Write) -> Result<(), FormatError> {
        let mut name_width = "NAME".len();
        let mut version_width = "VERSION".len();
        for package in &sbom.packages {
            name_width = name_width.max(package.name.len());
            version_width = version_width.max(package.version.len());
        }

        let mut write = |line: String| -> Result<(), FormatError> {
            out.write_all(line.as_bytes())
                .map_err(|e| FormatError::EncodeFailed {
                    format: "table".to_owned(),
                    reason: e.to_string(),
                })
        };

        write(format!(
            "{:name_width$}  {:version_width$}  TYPE\n",
            "NAME", "VERSION"
        ))?;
        for package in &sbom.packages {
            write(format!(
                "{:name_width$}  {:version_width$}  {}\n",
                package.name, package.version, package.package_type
            ))?;
        }
        write(format!("\n{} packages\n", sbom.package_count()))?;
        Ok(())
    }

    fn validate(&self, _input: &[u8]) -> Result<(), FormatError> {
        Err(FormatError::ValidationFailed {
            format: self.id().as_str().to_owned(),
            reason: "table is a display-only format".to_owned(),
        })
    }
}
