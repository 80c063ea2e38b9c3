//! 네이티브 JSON 형식
//!
//! 정준 모델을 그대로 serde로 직렬화하는 무손실 형식입니다.
//! 문서 루트에 `schema` 마커를 실어 내용 기반 판별에 씁니다.

use std::io::Write;

use serde::{Deserialize, Serialize};

use packhorse_core::error::FormatError;
use packhorse_core::types::Sbom;

use crate::format::{Format, FormatId};

/// 스키마 마커의 name 필드 값
const SCHEMA_NAME: &str = "packhorse";
/// 현재 스키마 버전
const SCHEMA_VERSION: &str = "1";

/// 네이티브 문서 봉투
#[derive(Serialize, Deserialize)]
struct PackhorseDocument {
    schema: SchemaMarker,
    sbom: Sbom,
}

/// 내용 기반 판별용 스키마 마커
#[derive(Serialize, Deserialize)]
struct SchemaMarker {
    name: String,
    version: String,
}

/// 네이티브 무손실 JSON 형식
pub struct PackhorseJsonFormat;

impl Format for PackhorseJsonFormat {
    fn id(&self) -> FormatId {
        FormatId::PackhorseJson
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["packhorse", "json", "native"]
    }

    fn identify(&self, input: &[u8]) -> bool {
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(input) else {
            return false;
        };
        value
            .get("schema")
            .and_then(|s| s.get("name"))
            .and_then(|n| n.as_str())
            == Some(SCHEMA_NAME)
    }

    fn decode(&self, input: &[u8]) -> Result<Sbom, FormatError> {
        let document: PackhorseDocument =
            serde_json::from_slice(input).map_err(|e| FormatError::DecodeFailed {
                format: self.id().as_str().to_owned(),
                reason: e.to_string(),
            })?;
        if document.schema.name != SCHEMA_NAME {
            return Err(FormatError::DecodeFailed {
                format: self.id().as_str().to_owned(),
                reason: format!("unexpected schema name '{}'", document.schema.name),
            });
        }
        Ok(document.sbom)
    }

    fn encode(&self, sbom: &Sbom, out: &mut dyn Write) -> Result<(), FormatError> {
        let document = PackhorseDocument {
            schema: SchemaMarker {
                name: SCHEMA_NAME.to_owned(),
                version: SCHEMA_VERSION.to_owned(),
            },
            sbom: sbom.clone(),
        };
        serde_json::to_writer_pretty(out, &document).map_err(|e| FormatError::EncodeFailed {
            format: self.id().as_str().to_owned(),
            reason: e.to_string(),
        })
    }
}
