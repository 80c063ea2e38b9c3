//! SPDX 2.3 JSON 형식
//!
//! [SPDX](https://spdx.dev/) 2.3 사양의 JSON 문서를 인코드/디코드합니다.
//! 패키지별 SPDX id는 이름/버전에서 결정론적으로 만들되, 동명 패키지
//! 충돌을 피하기 위해 정준 id 앞부분을 덧붙입니다.

use std::collections::HashMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

use packhorse_core::error::FormatError;
use packhorse_core::types::{
    Package, PackageMetadata, PackageType, Relationship, RelationshipKind, Sbom, SourceDescriptor,
    SourceScheme,
};

use crate::format::{Format, FormatId};
use crate::util;

/// 문서 자신의 SPDX id
pub(crate) const DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";

/// SPDX 2.3 문서 루트 구조
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument {
    spdx_version: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    data_license: String,
    document_namespace: String,
    creation_info: SpdxCreationInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    packages: Vec<SpdxPackage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    relationships: Vec<SpdxRelationship>,
}

/// SPDX 생성 정보
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxCreationInfo {
    created: String,
    creators: Vec<String>,
}

/// SPDX 패키지
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    version_info: String,
    download_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_info: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    external_refs: Vec<SpdxExternalRef>,
}

/// SPDX 외부 참조
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxExternalRef {
    reference_category: String,
    reference_type: String,
    reference_locator: String,
}

/// SPDX 관계
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxRelationship {
    spdx_element_id: String,
    relationship_type: String,
    related_spdx_element: String,
}

/// SPDX 2.3 JSON 형식
pub struct SpdxJsonFormat;

/// 패키지의 고유 SPDX id를 만듭니다.
pub(crate) fn spdx_package_id(pkg: &Package) -> String {
    let short = pkg.id.get(..8).unwrap_or(&pkg.id);
    format!("{}-{short}", util::spdx_id_for(&pkg.name, &pkg.version))
}

/// 정준 관계를 SPDX 관계 레코드로 변환합니다.
///
/// `ContainedBy(from, to)`는 `to CONTAINS from`으로,
/// `DependencyOf(from, to)`는 `to DEPENDS_ON from`으로 뒤집혀
/// 기록됩니다.
pub(crate) fn spdx_relationship_for(
    rel: &Relationship,
    ids: &HashMap<&str, String>,
) -> Option<(String, &'static str, String)> {
    let from = ids.get(rel.from.as_str())?.clone();
    let to = ids.get(rel.to.as_str())?.clone();
    let (element, kind, related) = match rel.kind {
        RelationshipKind::ContainedBy => (to, "CONTAINS", from),
        RelationshipKind::DependencyOf => (to, "DEPENDS_ON", from),
        RelationshipKind::DescribedBy => (to, "DESCRIBES", from),
    };
    Some((element, kind, related))
}

/// SPDX 관계 레코드를 정준 관계 종류로 되돌립니다.
pub(crate) fn relationship_kind_from_spdx(kind: &str) -> Option<RelationshipKind> {
    match kind {
        "CONTAINS" => Some(RelationshipKind::ContainedBy),
        "DEPENDS_ON" => Some(RelationshipKind::DependencyOf),
        "DESCRIBES" => Some(RelationshipKind::DescribedBy),
        _ => None,
    }
}

impl SpdxJsonFormat {
    fn build_document(sbom: &Sbom) -> SpdxDocument {
        let ids: HashMap<&str, String> = sbom
            .packages
            .iter()
            .map(|p| (p.id.as_str(), spdx_package_id(p)))
            .collect();

        let packages = sbom
            .packages
            .iter()
            .map(|pkg| SpdxPackage {
                spdx_id: ids[pkg.id.as_str()].clone(),
                name: pkg.name.clone(),
                version_info: pkg.version.clone(),
                download_location: "NOASSERTION".to_owned(),
                source_info: locations_source_info(pkg),
                external_refs: vec![SpdxExternalRef {
                    reference_category: "PACKAGE-MANAGER".to_owned(),
                    reference_type: "purl".to_owned(),
                    reference_locator: pkg.purl(),
                }],
            })
            .collect();

        let mut relationships: Vec<SpdxRelationship> = sbom
            .packages
            .iter()
            .map(|pkg| SpdxRelationship {
                spdx_element_id: DOCUMENT_ID.to_owned(),
                relationship_type: "DESCRIBES".to_owned(),
                related_spdx_element: ids[pkg.id.as_str()].clone(),
            })
            .collect();
        for rel in &sbom.relationships {
            if let Some((element, kind, related)) = spdx_relationship_for(rel, &ids) {
                relationships.push(SpdxRelationship {
                    spdx_element_id: element,
                    relationship_type: kind.to_owned(),
                    related_spdx_element: related,
                });
            }
        }

        SpdxDocument {
            spdx_version: "SPDX-2.3".to_owned(),
            spdx_id: DOCUMENT_ID.to_owned(),
            name: document_name(sbom),
            data_license: "CC0-1.0".to_owned(),
            document_namespace: format!("https://packhorse.dev/spdx/{}", uuid::Uuid::new_v4()),
            creation_info: SpdxCreationInfo {
                created: util::current_timestamp(),
                creators: vec![format!(
                    "Tool: {}-{}",
                    sbom.descriptor.name, sbom.descriptor.version
                )],
            },
            packages,
            relationships,
        }
    }
}

/// 문서 이름을 만듭니다 (대상 경로의 마지막 성분 기준).
pub(crate) fn document_name(sbom: &Sbom) -> String {
    let tail = sbom
        .source
        .target
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("scan");
    format!("packhorse-scan-{tail}")
}

/// 발견 위치들을 sourceInfo 문자열로 합칩니다.
fn locations_source_info(pkg: &Package) -> Option<String> {
    if pkg.locations.is_empty() {
        return None;
    }
    let joined = pkg
        .locations
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Some(joined)
}

impl Format for SpdxJsonFormat {
    fn id(&self) -> FormatId {
        FormatId::SpdxJson
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["spdx-json", "spdxjson"]
    }

    fn identify(&self, input: &[u8]) -> bool {
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(input) else {
            return false;
        };
        value
            .get("spdxVersion")
            .and_then(|v| v.as_str())
            .is_some_and(|v| v.starts_with("SPDX-"))
    }

    fn decode(&self, input: &[u8]) -> Result<Sbom, FormatError> {
        let document: SpdxDocument =
            serde_json::from_slice(input).map_err(|e| FormatError::DecodeFailed {
                format: self.id().as_str().to_owned(),
                reason: e.to_string(),
            })?;
        if !document.spdx_version.starts_with("SPDX-") {
            return Err(FormatError::DecodeFailed {
                format: self.id().as_str().to_owned(),
                reason: format!("unexpected spdxVersion '{}'", document.spdx_version),
            });
        }

        let mut sbom = Sbom::new(SourceDescriptor {
            scheme: SourceScheme::Directory,
            target: document.name.clone(),
        });

        // SPDX id → 재유도된 정준 id
        let mut spdx_to_id: HashMap<String, String> = HashMap::new();
        for spdx_pkg in &document.packages {
            let purl = spdx_pkg
                .external_refs
                .iter()
                .find(|r| r.reference_type == "purl")
                .map(|r| r.reference_locator.as_str());
            let package_type = purl
                .and_then(util::purl_ecosystem)
                .and_then(PackageType::from_str_loose)
                .unwrap_or(PackageType::Unknown);
            let locations = spdx_pkg
                .source_info
                .as_deref()
                .map(|info| info.split("; ").map(util::location_from_display).collect())
                .unwrap_or_default();

            let package = Package::new(
                spdx_pkg.name.clone(),
                spdx_pkg.version_info.clone(),
                package_type,
                locations,
                PackageMetadata::None,
            );
            spdx_to_id.insert(spdx_pkg.spdx_id.clone(), package.id.clone());
            sbom.add_package(package);
        }

        for rel in &document.relationships {
            if rel.spdx_element_id == DOCUMENT_ID || rel.related_spdx_element == DOCUMENT_ID {
                continue;
            }
            let Some(kind) = relationship_kind_from_spdx(&rel.relationship_type) else {
                continue;
            };
            let (Some(element), Some(related)) = (
                spdx_to_id.get(&rel.spdx_element_id),
                spdx_to_id.get(&rel.related_spdx_element),
            ) else {
                continue;
            };
            // 인코드 시 뒤집었으므로 복원도 뒤집어서
            sbom.add_relationship(Relationship {
                from: related.clone(),
                to: element.clone(),
                kind,
            });
        }

        sbom.finalize();
        Ok(sbom)
    }

    fn encode(&self, sbom: &Sbom, out: &mut dyn Write) -> Result<(), FormatError> {
        let document = Self::build_document(sbom);
        serde_json::to_writer_pretty(out, &document).map_err(|e| FormatError::EncodeFailed {
            format: self.id().as_str().to_owned(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packhorse_core::types::Location;

    fn sample_sbom() -> Sbom {
        let mut sbom = Sbom::new(SourceDescriptor {
            scheme: SourceScheme::Directory,
            target: "/opt/app".to_owned(),
        });
        let outer = Package::new(
            "bundle",
            "1.0",
            PackageType::Archive,
            vec![Location::new("/opt/app/bundle.zip")],
            PackageMetadata::None,
        );
        let inner = Package::new(
            "inner-lib",
            "2.0",
            PackageType::Java,
            vec![Location::with_virtual("/opt/app/bundle.zip", "lib/inner.jar")],
            PackageMetadata::None,
        );
        sbom.add_relationship(Relationship {
            from: inner.id.clone(),
            to: outer.id.clone(),
            kind: RelationshipKind::ContainedBy,
        });
        sbom.add_package(outer);
        sbom.add_package(inner);
        sbom.finalize();
        sbom
    }

    #[test]
    fn encode_emits_required_fields() {
        let format = SpdxJsonFormat;
        let mut buf = Vec::new();
        format.encode(&sample_sbom(), &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["spdxVersion"], "SPDX-2.3");
        assert_eq!(value["SPDXID"], "SPDXRef-DOCUMENT");
        assert_eq!(value["dataLicense"], "CC0-1.0");
        assert_eq!(value["name"], "packhorse-scan-app");
        assert_eq!(value["packages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn encode_writes_contains_relationship() {
        let format = SpdxJsonFormat;
        let mut buf = Vec::new();
        format.encode(&sample_sbom(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("CONTAINS"));
        assert!(text.contains("DESCRIBES"));
    }

    #[test]
    fn round_trip_preserves_packages_and_containment() {
        let format = SpdxJsonFormat;
        let sbom = sample_sbom();
        let mut buf = Vec::new();
        format.encode(&sbom, &mut buf).unwrap();
        let decoded = format.decode(&buf).unwrap();

        assert_eq!(decoded.package_count(), 2);
        let inner = decoded.packages.iter().find(|p| p.name == "inner-lib").unwrap();
        assert_eq!(inner.package_type, PackageType::Java);
        assert_eq!(
            inner.locations[0].virtual_path.as_deref(),
            Some("lib/inner.jar")
        );
        assert_eq!(decoded.relationships.len(), 1);
        assert_eq!(decoded.relationships[0].kind, RelationshipKind::ContainedBy);
    }

    #[test]
    fn unique_namespace_per_encode() {
        let format = SpdxJsonFormat;
        let sbom = sample_sbom();
        let mut a = Vec::new();
        let mut b = Vec::new();
        format.encode(&sbom, &mut a).unwrap();
        format.encode(&sbom, &mut b).unwrap();
        let va: serde_json::Value = serde_json::from_slice(&a).unwrap();
        let vb: serde_json::Value = serde_json::from_slice(&b).unwrap();
        assert_ne!(va["documentNamespace"], vb["documentNamespace"]);
    }

    #[test]
    fn identify_requires_spdx_version() {
        let format = SpdxJsonFormat;
        assert!(format.identify(br#"{"spdxVersion": "SPDX-2.3"}"#));
        assert!(!format.identify(br#"{"bomFormat": "CycloneDX"}"#));
        assert!(!format.identify(b""));
        assert!(!format.identify(b"SPDXVersion: SPDX-2.3"));
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(SpdxJsonFormat.decode(b"").is_err());
    }
}
