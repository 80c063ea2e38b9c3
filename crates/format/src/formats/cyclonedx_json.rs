//! CycloneDX 1.5 JSON 형식
//!
//! [CycloneDX](https://cyclonedx.org/) 1.5 사양의 JSON 문서를
//! 인코드/디코드합니다. 정준 모델 고유 정보(패키지 유형, 발견 위치,
//! 포함 관계)는 component properties로 실어 나릅니다.

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

/// 패키지 유형을 실어 나르는 property 이름
pub(crate) const PROP_PACKAGE_TYPE: &str = "packhorse:package-type";
/// 발견 위치를 실어 나르는 property 이름 (위치당 하나)
pub(crate) const PROP_LOCATION: &str = "packhorse:location";
/// 포함 관계를 실어 나르는 property 이름 (값 = 감싸는 컴포넌트의 bom-ref)
pub(crate) const PROP_CONTAINED_BY: &str = "packhorse:contained-by";

/// CycloneDX 1.5 BOM 루트 구조
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxBom {
    bom_format: String,
    spec_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial_number: Option<String>,
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<CycloneDxMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    components: Vec<CycloneDxComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<CycloneDxDependency>,
}

/// CycloneDX 메타데이터
#[derive(Serialize, Deserialize)]
struct CycloneDxMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<CycloneDxTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    component: Option<CycloneDxSubject>,
}

/// CycloneDX 도구 정보
#[derive(Serialize, Deserialize)]
struct CycloneDxTool {
    name: String,
    version: String,
}

/// 스캔 대상 (metadata.component)
#[derive(Serialize, Deserialize)]
struct CycloneDxSubject {
    #[serde(rename = "type")]
    subject_type: String,
    name: String,
}

/// CycloneDX 컴포넌트
#[derive(Serialize, Deserialize)]
struct CycloneDxComponent {
    #[serde(rename = "type")]
    component_type: String,
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    bom_ref: Option<String>,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    properties: Vec<CycloneDxProperty>,
}

/// CycloneDX property (이름/값 쌍)
#[derive(Serialize, Deserialize)]
struct CycloneDxProperty {
    name: String,
    value: String,
}

/// CycloneDX 의존성 그래프 항목
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxDependency {
    #[serde(rename = "ref")]
    dependency_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
}

/// CycloneDX 1.5 JSON 형식
pub struct CycloneDxJsonFormat;

impl CycloneDxJsonFormat {
    fn build_bom(sbom: &Sbom) -> CycloneDxBom {
        let components = sbom.packages.iter().map(|pkg| component_for(pkg, sbom)).collect();

        // DependencyOf(from, to) = from은 to의 의존성 → to가 from에 의존
        let mut depends: HashMap<&str, Vec<String>> = HashMap::new();
        for rel in &sbom.relationships {
            if rel.kind == RelationshipKind::DependencyOf {
                depends.entry(rel.to.as_str()).or_default().push(rel.from.clone());
            }
        }
        let mut dependencies: Vec<CycloneDxDependency> = depends
            .into_iter()
            .map(|(r, mut on)| {
                on.sort();
                CycloneDxDependency {
                    dependency_ref: r.to_owned(),
                    depends_on: on,
                }
            })
            .collect();
        dependencies.sort_by(|a, b| a.dependency_ref.cmp(&b.dependency_ref));

        CycloneDxBom {
            bom_format: "CycloneDX".to_owned(),
            spec_version: "1.5".to_owned(),
            serial_number: Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
            version: 1,
            metadata: Some(CycloneDxMetadata {
                timestamp: Some(util::current_timestamp()),
                tools: Some(vec![CycloneDxTool {
                    name: sbom.descriptor.name.clone(),
                    version: sbom.descriptor.version.clone(),
                }]),
                component: Some(CycloneDxSubject {
                    subject_type: match sbom.source.scheme {
                        SourceScheme::Directory => "application".to_owned(),
                        SourceScheme::File => "file".to_owned(),
                    },
                    name: sbom.source.target.clone(),
                }),
            }),
            components,
            dependencies,
        }
    }
}

/// 패키지 하나를 컴포넌트로 변환합니다.
fn component_for(pkg: &Package, sbom: &Sbom) -> CycloneDxComponent {
    let mut properties = vec![CycloneDxProperty {
        name: PROP_PACKAGE_TYPE.to_owned(),
        value: pkg.package_type.to_string(),
    }];
    for location in &pkg.locations {
        properties.push(CycloneDxProperty {
            name: PROP_LOCATION.to_owned(),
            value: location.to_string(),
        });
    }
    for rel in &sbom.relationships {
        if rel.kind == RelationshipKind::ContainedBy && rel.from == pkg.id {
            properties.push(CycloneDxProperty {
                name: PROP_CONTAINED_BY.to_owned(),
                value: rel.to.clone(),
            });
        }
    }

    CycloneDxComponent {
        component_type: "library".to_owned(),
        bom_ref: Some(pkg.id.clone()),
        name: pkg.name.clone(),
        version: pkg.version.clone(),
        purl: Some(pkg.purl()),
        properties,
    }
}

/// 컴포넌트에서 패키지 유형을 복원합니다.
fn package_type_of(component: &CycloneDxComponent) -> PackageType {
    component
        .properties
        .iter()
        .find(|p| p.name == PROP_PACKAGE_TYPE)
        .and_then(|p| PackageType::from_str_loose(&p.value))
        .or_else(|| {
            component
                .purl
                .as_deref()
                .and_then(util::purl_ecosystem)
                .and_then(PackageType::from_str_loose)
        })
        .unwrap_or(PackageType::Unknown)
}

impl Format for CycloneDxJsonFormat {
    fn id(&self) -> FormatId {
        FormatId::CycloneDxJson
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["cyclonedx-json", "cdx-json"]
    }

    fn identify(&self, input: &[u8]) -> bool {
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(input) else {
            return false;
        };
        value.get("bomFormat").and_then(|v| v.as_str()) == Some("CycloneDX")
    }

    fn decode(&self, input: &[u8]) -> Result<Sbom, FormatError> {
        let bom: CycloneDxBom =
            serde_json::from_slice(input).map_err(|e| FormatError::DecodeFailed {
                format: self.id().as_str().to_owned(),
                reason: e.to_string(),
            })?;
        if bom.bom_format != "CycloneDX" {
            return Err(FormatError::DecodeFailed {
                format: self.id().as_str().to_owned(),
                reason: format!("unexpected bomFormat '{}'", bom.bom_format),
            });
        }

        let source = bom
            .metadata
            .as_ref()
            .and_then(|m| m.component.as_ref())
            .map(|subject| SourceDescriptor {
                scheme: if subject.subject_type == "file" {
                    SourceScheme::File
                } else {
                    SourceScheme::Directory
                },
                target: subject.name.clone(),
            })
            .unwrap_or(SourceDescriptor {
                scheme: SourceScheme::Directory,
                target: String::new(),
            });

        let mut sbom = Sbom::new(source);
        // bom-ref → 재유도된 패키지 id (관계 복원용)
        let mut ref_to_id: HashMap<String, String> = HashMap::new();
        let mut contained: Vec<(String, String)> = Vec::new();

        for component in &bom.components {
            let locations = component
                .properties
                .iter()
                .filter(|p| p.name == PROP_LOCATION)
                .map(|p| util::location_from_display(&p.value))
                .collect();
            let package = Package::new(
                component.name.clone(),
                component.version.clone(),
                package_type_of(component),
                locations,
                PackageMetadata::None,
            );
            if let Some(bom_ref) = &component.bom_ref {
                ref_to_id.insert(bom_ref.clone(), package.id.clone());
                for p in &component.properties {
                    if p.name == PROP_CONTAINED_BY {
                        contained.push((bom_ref.clone(), p.value.clone()));
                    }
                }
            }
            sbom.add_package(package);
        }

        for (inner_ref, outer_ref) in contained {
            if let (Some(from), Some(to)) = (ref_to_id.get(&inner_ref), ref_to_id.get(&outer_ref)) {
                sbom.add_relationship(Relationship {
                    from: from.clone(),
                    to: to.clone(),
                    kind: RelationshipKind::ContainedBy,
                });
            }
        }
        for dependency in &bom.dependencies {
            let Some(to) = ref_to_id.get(&dependency.dependency_ref) else {
                continue;
            };
            for dep_ref in &dependency.depends_on {
                if let Some(from) = ref_to_id.get(dep_ref) {
                    sbom.add_relationship(Relationship {
                        from: from.clone(),
                        to: to.clone(),
                        kind: RelationshipKind::DependencyOf,
                    });
                }
            }
        }

        sbom.finalize();
        Ok(sbom)
    }

    fn encode(&self, sbom: &Sbom, out: &mut dyn Write) -> Result<(), FormatError> {
        let bom = Self::build_bom(sbom);
        serde_json::to_writer_pretty(out, &bom).map_err(|e| FormatError::EncodeFailed {
            format: self.id().as_str().to_owned(),
            reason: e.to_string(),
        })
    }
}
