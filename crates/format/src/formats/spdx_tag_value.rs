//! SPDX 2.3 tag-value 형식
//!
//! 한 줄에 `Tag: Value` 하나씩 쓰는 SPDX 원래의 텍스트 표기입니다.
//! 파서는 줄 단위로 동작하며 `PackageName` 태그를 패키지 경계로 봅니다.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

use packhorse_core::error::FormatError;
use packhorse_core::types::{
    Package, PackageMetadata, PackageType, Relationship, Sbom, SourceDescriptor, SourceScheme,
};

use crate::format::{Format, FormatId};
use crate::formats::spdx_json::{
    document_name, relationship_kind_from_spdx, spdx_package_id, spdx_relationship_for,
    DOCUMENT_ID,
};
use crate::util;

/// SPDX 2.3 tag-value 형식
pub struct SpdxTagValueFormat;

/// 파싱 중인 패키지 블록
#[derive(Default)]
struct PackageBlock {
    spdx_id: String,
    name: String,
    version: String,
    source_info: String,
    purl: String,
}

impl PackageBlock {
    fn into_package(self) -> Package {
        let package_type = util::purl_ecosystem(&self.purl)
            .and_then(PackageType::from_str_loose)
            .unwrap_or(PackageType::Unknown);
        let locations = if self.source_info.is_empty() {
            Vec::new()
        } else {
            self.source_info
                .split("; ")
                .map(util::location_from_display)
                .collect()
        };
        Package::new(
            self.name,
            self.version,
            package_type,
            locations,
            PackageMetadata::None,
        )
    }
}

impl Format for SpdxTagValueFormat {
    fn id(&self) -> FormatId {
        FormatId::SpdxTagValue
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["spdx", "spdx-tag-value", "spdx-tv", "spdxtv", "tag-value", "tv"]
    }

    fn identify(&self, input: &[u8]) -> bool {
        let Ok(text) = std::str::from_utf8(input) else {
            return false;
        };
        // 첫 유효 줄이 SPDXVersion이어야 함
        text.lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .is_some_and(|l| l.starts_with("SPDXVersion:"))
    }

    fn decode(&self, input: &[u8]) -> Result<Sbom, FormatError> {
        let text = std::str::from_utf8(input).map_err(|e| self.decode_err(e.to_string()))?;
        if !self.identify(input) {
            return Err(self.decode_err("first tag must be SPDXVersion".to_owned()));
        }

        let mut document_name = String::new();
        let mut current: Option<PackageBlock> = None;
        let mut blocks: Vec<PackageBlock> = Vec::new();
        // (element, type, related) — 패키지 id 매핑이 끝난 뒤 해석
        let mut raw_relationships: Vec<(String, String, String)> = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((tag, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match tag.trim() {
                "DocumentName" => document_name = value.to_owned(),
                "PackageName" => {
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                    current = Some(PackageBlock {
                        name: value.to_owned(),
                        ..PackageBlock::default()
                    });
                }
                "SPDXID" => {
                    if let Some(block) = current.as_mut() {
                        block.spdx_id = value.to_owned();
                    }
                }
                "PackageVersion" => {
                    if let Some(block) = current.as_mut() {
                        block.version = value.to_owned();
                    }
                }
                "PackageSourceInfo" => {
                    if let Some(block) = current.as_mut() {
                        block.source_info = value.to_owned();
                    }
                }
                "ExternalRef" => {
                    // "PACKAGE-MANAGER purl pkg:..."
                    if let Some(block) = current.as_mut() {
                        let mut parts = value.split_whitespace();
                        if parts.next() == Some("PACKAGE-MANAGER")
                            && parts.next() == Some("purl")
                            && let Some(purl) = parts.next()
                        {
                            block.purl = purl.to_owned();
                        }
                    }
                }
                "Relationship" => {
                    let mut parts = value.split_whitespace();
                    if let (Some(element), Some(kind), Some(related)) =
                        (parts.next(), parts.next(), parts.next())
                    {
                        raw_relationships.push((
                            element.to_owned(),
                            kind.to_owned(),
                            related.to_owned(),
                        ));
                    }
                }
                _ => {}
            }
        }
        if let Some(block) = current.take() {
            blocks.push(block);
        }

        let mut sbom = Sbom::new(SourceDescriptor {
            scheme: SourceScheme::Directory,
            target: document_name,
        });
        let mut spdx_to_id: HashMap<String, String> = HashMap::new();
        for block in blocks {
            let spdx_id = block.spdx_id.clone();
            let package = block.into_package();
            if !spdx_id.is_empty() {
                spdx_to_id.insert(spdx_id, package.id.clone());
            }
            sbom.add_package(package);
        }

        for (element, kind, related) in raw_relationships {
            if element == DOCUMENT_ID || related == DOCUMENT_ID {
                continue;
            }
            let Some(kind) = relationship_kind_from_spdx(&kind) else {
                continue;
            };
            let (Some(element), Some(related)) =
                (spdx_to_id.get(&element), spdx_to_id.get(&related))
            else {
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
        let ids: HashMap<&str, String> = sbom
            .packages
            .iter()
            .map(|p| (p.id.as_str(), spdx_package_id(p)))
            .collect();

        let mut doc = String::new();
        let _ = writeln!(doc, "SPDXVersion: SPDX-2.3");
        let _ = writeln!(doc, "DataLicense: CC0-1.0");
        let _ = writeln!(doc, "SPDXID: {DOCUMENT_ID}");
        let _ = writeln!(doc, "DocumentName: {}", document_name(sbom));
        let _ = writeln!(
            doc,
            "DocumentNamespace: https://packhorse.dev/spdx/{}",
            uuid::Uuid::new_v4()
        );
        let _ = writeln!(
            doc,
            "Creator: Tool: {}-{}",
            sbom.descriptor.name, sbom.descriptor.version
        );
        let _ = writeln!(doc, "Created: {}", util::current_timestamp());

        for package in &sbom.packages {
            let _ = writeln!(doc);
            let _ = writeln!(doc, "PackageName: {}", package.name);
            let _ = writeln!(doc, "SPDXID: {}", ids[package.id.as_str()]);
            if !package.version.is_empty() {
                let _ = writeln!(doc, "PackageVersion: {}", package.version);
            }
            let _ = writeln!(doc, "PackageDownloadLocation: NOASSERTION");
            if !package.locations.is_empty() {
                let joined = package
                    .locations
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                let _ = writeln!(doc, "PackageSourceInfo: {joined}");
            }
            let _ = writeln!(
                doc,
                "ExternalRef: PACKAGE-MANAGER purl {}",
                package.purl()
            );
        }

        let _ = writeln!(doc);
        for package in &sbom.packages {
            let _ = writeln!(
                doc,
                "Relationship: {DOCUMENT_ID} DESCRIBES {}",
                ids[package.id.as_str()]
            );
        }
        for rel in &sbom.relationships {
            if let Some((element, kind, related)) = spdx_relationship_for(rel, &ids) {
                let _ = writeln!(doc, "Relationship: {element} {kind} {related}");
            }
        }

        out.write_all(doc.as_bytes())
            .map_err(|e| FormatError::EncodeFailed {
                format: self.id().as_str().to_owned(),
                reason: e.to_string(),
            })
    }
}

impl SpdxTagValueFormat {
    fn decode_err(&self, reason: String) -> FormatError {
        FormatError::DecodeFailed {
            format: self.id().as_str().to_owned(),
            reason,
        }
    }
}
