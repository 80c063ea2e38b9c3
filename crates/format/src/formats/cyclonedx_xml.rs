//! CycloneDX 1.5 XML 형식
//!
//! 작은 고정 스키마이므로 XML 작성기와 스캐너를 직접 구현합니다.
//! 디코더는 관대한 태그 스캐너로, 알 수 없는 요소는 무시하고
//! `<component>` 블록만 찾아 읽습니다. 정준 모델 고유 정보(패키지
//! 유형, 발견 위치, 포함 관계)는 JSON 형식과 같은 `packhorse:*`
//! property로 실어 나릅니다.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

use packhorse_core::error::FormatError;
use packhorse_core::types::{
    Package, PackageMetadata, PackageType, Relationship, RelationshipKind, Sbom, SourceDescriptor,
    SourceScheme,
};

use crate::format::{Format, FormatId};
use crate::formats::cyclonedx_json::{PROP_CONTAINED_BY, PROP_LOCATION, PROP_PACKAGE_TYPE};
use crate::util::{self, xml_escape, xml_unescape};

/// CycloneDX 1.5 XML 네임스페이스
const XMLNS: &str = "http://cyclonedx.org/schema/bom/1.5";

/// CycloneDX 1.5 XML 형식
pub struct CycloneDxXmlFormat;

impl Format for CycloneDxXmlFormat {
    fn id(&self) -> FormatId {
        FormatId::CycloneDxXml
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["cyclonedx-xml", "cyclonedx", "cdx", "xml"]
    }

    fn identify(&self, input: &[u8]) -> bool {
        let Ok(text) = std::str::from_utf8(input) else {
            return false;
        };
        (text.contains("<bom ") || text.contains("<bom>")) && text.contains("cyclonedx.org/schema/bom")
    }

    fn decode(&self, input: &[u8]) -> Result<Sbom, FormatError> {
        let text = std::str::from_utf8(input).map_err(|e| self.decode_err(e.to_string()))?;
        if !self.identify(input) {
            return Err(self.decode_err("missing <bom> root with CycloneDX namespace".to_owned()));
        }

        // 대상 이름은 metadata 안의 component에서만 읽음 (tool 이름과 구분)
        let subject = element_blocks(text, "metadata").next().and_then(|meta| {
            element_blocks(&meta, "component")
                .next()
                .and_then(|c| tag_content(&c, "name"))
        });
        let mut sbom = Sbom::new(SourceDescriptor {
            scheme: SourceScheme::Directory,
            target: subject.unwrap_or_default(),
        });

        // 패키지 컴포넌트는 <components> 영역 안에서만 스캔
        let components_region = element_blocks(text, "components").next().unwrap_or_default();
        let mut ref_to_id: HashMap<String, String> = HashMap::new();
        let mut contained: Vec<(String, String)> = Vec::new();
        for block in element_blocks(&components_region, "component") {
            let Some(name) = tag_content(&block, "name") else {
                continue;
            };
            let version = tag_content(&block, "version").unwrap_or_default();
            let purl = tag_content(&block, "purl");

            let mut package_type = None;
            let mut locations = Vec::new();
            let mut contained_by = Vec::new();
            for prop in element_blocks(&block, "property") {
                let (Some(prop_name), Some(value)) =
                    (attr_value(&prop, "name"), element_text(&prop))
                else {
                    continue;
                };
                match prop_name.as_str() {
                    PROP_PACKAGE_TYPE => package_type = PackageType::from_str_loose(&value),
                    PROP_LOCATION => locations.push(util::location_from_display(&value)),
                    PROP_CONTAINED_BY => contained_by.push(value),
                    _ => {}
                }
            }
            let package_type = package_type
                .or_else(|| {
                    purl.as_deref()
                        .and_then(util::purl_ecosystem)
                        .and_then(PackageType::from_str_loose)
                })
                .unwrap_or(PackageType::Unknown);

            let package = Package::new(name, version, package_type, locations, PackageMetadata::None);
            for outer_ref in contained_by {
                contained.push((package.id.clone(), outer_ref));
            }
            if let Some(bom_ref) = attr_value(&block, "bom-ref") {
                ref_to_id.insert(bom_ref, package.id.clone());
            }
            sbom.add_package(package);
        }

        for (from, outer_ref) in contained {
            if let Some(to) = ref_to_id.get(&outer_ref) {
                sbom.add_relationship(Relationship {
                    from,
                    to: to.clone(),
                    kind: RelationshipKind::ContainedBy,
                });
            }
        }

        sbom.finalize();
        Ok(sbom)
    }

    fn encode(&self, sbom: &Sbom, out: &mut dyn Write) -> Result<(), FormatError> {
        let mut doc = String::new();
        let _ = writeln!(doc, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            doc,
            r#"<bom xmlns="{XMLNS}" version="1" serialNumber="urn:uuid:{}">"#,
            uuid::Uuid::new_v4()
        );
        let _ = writeln!(doc, "  <metadata>");
        let _ = writeln!(doc, "    <timestamp>{}</timestamp>", util::current_timestamp());
        let _ = writeln!(doc, "    <tools>");
        let _ = writeln!(doc, "      <tool>");
        let _ = writeln!(doc, "        <name>{}</name>", xml_escape(&sbom.descriptor.name));
        let _ = writeln!(
            doc,
            "        <version>{}</version>",
            xml_escape(&sbom.descriptor.version)
        );
        let _ = writeln!(doc, "      </tool>");
        let _ = writeln!(doc, "    </tools>");
        let _ = writeln!(doc, "    <component type=\"application\">");
        let _ = writeln!(doc, "      <name>{}</name>", xml_escape(&sbom.source.target));
        let _ = writeln!(doc, "    </component>");
        let _ = writeln!(doc, "  </metadata>");
        let _ = writeln!(doc, "  <components>");
        for package in &sbom.packages {
            let _ = writeln!(
                doc,
                "    <component type=\"library\" bom-ref=\"{}\">",
                xml_escape(&package.id)
            );
            let _ = writeln!(doc, "      <name>{}</name>", xml_escape(&package.name));
            if !package.version.is_empty() {
                let _ = writeln!(doc, "      <version>{}</version>", xml_escape(&package.version));
            }
            let _ = writeln!(doc, "      <purl>{}</purl>", xml_escape(&package.purl()));
            let _ = writeln!(doc, "      <properties>");
            let _ = writeln!(
                doc,
                "        <property name=\"{PROP_PACKAGE_TYPE}\">{}</property>",
                package.package_type
            );
            for location in &package.locations {
                let _ = writeln!(
                    doc,
                    "        <property name=\"{PROP_LOCATION}\">{}</property>",
                    xml_escape(&location.to_string())
                );
            }
            for rel in &sbom.relationships {
                if rel.kind == RelationshipKind::ContainedBy && rel.from == package.id {
                    let _ = writeln!(
                        doc,
                        "        <property name=\"{PROP_CONTAINED_BY}\">{}</property>",
                        xml_escape(&rel.to)
                    );
                }
            }
            let _ = writeln!(doc, "      </properties>");
            let _ = writeln!(doc, "    </component>");
        }
        let _ = writeln!(doc, "  </components>");
        let _ = writeln!(doc, "</bom>");

        out.write_all(doc.as_bytes())
            .map_err(|e| FormatError::EncodeFailed {
                format: self.id().as_str().to_owned(),
                reason: e.to_string(),
            })
    }
}

impl CycloneDxXmlFormat {
    fn decode_err(&self, reason: String) -> FormatError {
        FormatError::DecodeFailed {
            format: self.id().as_str().to_owned(),
            reason,
        }
    }
}

/// 주어진 요소 블록들을 여는 태그부터 닫는 태그까지 차례로 돌려줍니다.
///
/// 중첩 없는 평평한 스키마를 가정한 관대한 스캐너입니다. 속성이 있는
/// 여는 태그(`<component type="...">`)와 없는 태그를 모두 받으며,
/// 속성은 [`attr_value`]로 꺼냅니다.
fn element_blocks<'a>(text: &'a str, element: &'a str) -> impl Iterator<Item = String> + 'a {
    let open_a = format!("<{element} ");
    let open_b = format!("<{element}>");
    let close = format!("</{element}>");
    let mut rest = text;
    std::iter::from_fn(move || {
        let start = match (rest.find(&open_a), rest.find(&open_b)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => return None,
        };
        let after_open = rest[start..].find('>').map(|i| start + i + 1)?;
        let end = rest[after_open..].find(&close).map(|i| after_open + i)?;
        let block = rest[start..end + close.len()].to_owned();
        rest = &rest[end + close.len()..];
        Some(block)
    })
}

/// 블록의 여는 태그에서 속성값을 꺼내고 이스케이프를 되돌립니다.
fn attr_value(block: &str, attr: &str) -> Option<String> {
    let open_tag = &block[..block.find('>')?];
    let marker = format!("{attr}=\"");
    let start = open_tag.find(&marker)? + marker.len();
    let end = open_tag[start..].find('"')? + start;
    Some(xml_unescape(&open_tag[start..end]))
}

/// 블록의 텍스트 내용(여는 태그와 닫는 태그 사이)을 꺼냅니다.
fn element_text(block: &str) -> Option<String> {
    let start = block.find('>')? + 1;
    let end = block.rfind("</")?;
    (end >= start).then(|| xml_unescape(block[start..end].trim()))
}

/// 블록에서 `<tag>값</tag>`의 값을 꺼내고 이스케이프를 되돌립니다.
fn tag_content(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = block.find(&open)? + open.len();
    let end = block[start..].find(&close)? + start;
    Some(xml_unescape(block[start..end].trim()))
}
