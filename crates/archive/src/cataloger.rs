//! 중첩 아카이브 카탈로거
//!
//! 리졸버가 찾은 zip 계열 파일마다 페이로드 탐지 → 매니페스트 →
//! 추출을 수행하고, 안에서 발견한 아카이브로 재귀 예산 안에서
//! 내려갑니다. 내부 패키지는 감싸는 아카이브 패키지로의
//! `ContainedBy` 관계를 갖습니다.
//!
//! 아카이브 하나의 실패는 경고 후 건너뛰며 형제 아카이브 처리를
//! 막지 않습니다. 예산이 소진되면 더 내려가지 않을 뿐 스캔 자체는
//! 성공합니다.

use std::fs::File;
use std::io;
use std::path::Path;

use metrics::counter;
use tracing::{debug, warn};

use packhorse_core::catalog::Cataloger;
use packhorse_core::error::PackhorseError;
use packhorse_core::metrics::{
    ARCHIVE_DEPTH_LIMITED_TOTAL, ARCHIVE_PROCESSED_TOTAL, ARCHIVE_SKIPPED_TOTAL,
};
use packhorse_core::resolver::FileResolver;
use packhorse_core::types::{
    Location, Package, PackageMetadata, PackageType, Relationship, RelationshipKind,
};

use crate::config::ArchiveConfig;
use crate::java::{JavaArchiveManifest, name_and_version_from_filename};
use crate::manifest::{ManifestEntry, read_manifest};
use crate::workspace::{extract, sanitize_entry_path};
use crate::zip::locate_payload;

/// 카탈로깅 대상 아카이브 접미사
const ARCHIVE_SUFFIXES: &[&str] = &[".zip", ".jar", ".war", ".ear"];

/// Java 매니페스트의 아카이브 내 경로
const JAVA_MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// zip 계열 아카이브 카탈로거
pub struct ArchiveCataloger {
    config: ArchiveConfig,
}

impl ArchiveCataloger {
    /// 설정으로 카탈로거를 생성합니다.
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// 아카이브 하나를 처리하고 해당 아카이브 패키지의 id를 반환합니다.
    ///
    /// `budget`은 이 아카이브 아래로 내려갈 수 있는 남은 깊이입니다.
    /// 0이면 아카이브 자신은 보고하되 중첩 아카이브로는 내려가지
    /// 않습니다.
    fn process_archive(
        &self,
        file_path: &Path,
        location: &Location,
        budget: u32,
        packages: &mut Vec<Package>,
        relationships: &mut Vec<Relationship>,
    ) -> Result<String, PackhorseError> {
        let mut file = File::open(file_path).map_err(PackhorseError::Io)?;
        let payload_offset = locate_payload(&mut file)?;
        drop(file);

        let mut manifest = read_manifest(file_path, payload_offset)?;
        if manifest.len() > self.config.max_entries {
            warn!(
                archive = %location,
                entries = manifest.len(),
                limit = self.config.max_entries,
                "archive exceeds entry limit, processing a prefix"
            );
            manifest.entries.truncate(self.config.max_entries);
        }

        let descend = budget > 0;
        let mut handle = extract(
            file_path,
            &manifest,
            |e| e.path == JAVA_MANIFEST_PATH || (descend && is_nested_archive(e)),
            self.config.max_entry_size,
        )?;

        let java_manifest = read_java_manifest(handle.root());
        let outer_id = self.emit_archive_package(location, java_manifest, packages);

        for entry in &manifest.entries {
            if !is_nested_archive(entry) {
                continue;
            }
            if budget == 0 {
                debug!(archive = %location, entry = %entry.path, "recursion budget exhausted, not descending");
                counter!(ARCHIVE_DEPTH_LIMITED_TOTAL).increment(1);
                continue;
            }
            let Some(rel_path) = sanitize_entry_path(&entry.path) else {
                continue;
            };
            let extracted = handle.root().join(rel_path);
            if !extracted.exists() {
                // 크기 제한이나 비지원 압축으로 추출 단계에서 빠진 엔트리
                continue;
            }
            let child_location = nested_location(location, &entry.path);
            match self.process_archive(
                &extracted,
                &child_location,
                budget - 1,
                packages,
                relationships,
            ) {
                Ok(child_id) => {
                    relationships.push(Relationship {
                        from: child_id,
                        to: outer_id.clone(),
                        kind: RelationshipKind::ContainedBy,
                    });
                }
                Err(e) => {
                    warn!(archive = %child_location, error = %e, "skipping nested archive");
                    counter!(ARCHIVE_SKIPPED_TOTAL).increment(1);
                }
            }
        }

        if let Err(e) = handle.release() {
            warn!(archive = %location, error = %e, "failed to release extraction workspace");
        }
        counter!(ARCHIVE_PROCESSED_TOTAL).increment(1);
        Ok(outer_id)
    }

    /// 아카이브 자신을 패키지로 방출하고 id를 반환합니다.
    fn emit_archive_package(
        &self,
        location: &Location,
        java_manifest: Option<JavaArchiveManifest>,
        packages: &mut Vec<Package>,
    ) -> String {
        let file_name = display_file_name(location);
        let (fallback_name, fallback_version) = name_and_version_from_filename(&file_name);

        let (name, version, metadata) = match java_manifest {
            Some(mf) if !mf.is_empty() => {
                let name = mf.implementation_title.clone().unwrap_or(fallback_name);
                let version = mf
                    .implementation_version
                    .clone()
                    .or(fallback_version)
                    .unwrap_or_default();
                let metadata = PackageMetadata::JavaManifest {
                    implementation_title: mf.implementation_title,
                    implementation_version: mf.implementation_version,
                    implementation_vendor: mf.implementation_vendor,
                };
                (name, version, metadata)
            }
            _ => (
                fallback_name,
                fallback_version.unwrap_or_default(),
                PackageMetadata::None,
            ),
        };

        let package = Package::new(
            name,
            version,
            package_type_for(&file_name),
            vec![location.clone()],
            metadata,
        );
        let id = package.id.clone();
        packages.push(package);
        id
    }
}

impl Cataloger for ArchiveCataloger {
    fn name(&self) -> &str {
        "archive-cataloger"
    }

    fn catalog(
        &self,
        resolver: &dyn FileResolver,
    ) -> Result<(Vec<Package>, Vec<Relationship>), PackhorseError> {
        let mut packages = Vec::new();
        let mut relationships = Vec::new();

        for location in resolver.files_by_suffix(ARCHIVE_SUFFIXES)? {
            let result = match resolver.access_path(&location) {
                Some(path) => self.process_archive(
                    &path,
                    &location,
                    self.config.max_depth,
                    &mut packages,
                    &mut relationships,
                ),
                None => self.process_virtual(resolver, &location, &mut packages, &mut relationships),
            };
            if let Err(e) = result {
                warn!(archive = %location, error = %e, "skipping archive");
                counter!(ARCHIVE_SKIPPED_TOTAL).increment(1);
            }
        }

        Ok((packages, relationships))
    }
}

impl ArchiveCataloger {
    /// 디스크 경로가 없는 리졸버의 내용을 임시 파일로 복사해 처리합니다.
    fn process_virtual(
        &self,
        resolver: &dyn FileResolver,
        location: &Location,
        packages: &mut Vec<Package>,
        relationships: &mut Vec<Relationship>,
    ) -> Result<String, PackhorseError> {
        let mut reader = resolver.open_by_location(location)?;
        let mut staging = tempfile::NamedTempFile::new().map_err(PackhorseError::Io)?;
        io::copy(&mut reader, &mut staging).map_err(PackhorseError::Io)?;
        self.process_archive(
            staging.path(),
            location,
            self.config.max_depth,
            packages,
            relationships,
        )
    }
}

/// 엔트리가 카탈로깅 대상 중첩 아카이브인지 여부
fn is_nested_archive(entry: &ManifestEntry) -> bool {
    if entry.is_dir {
        return false;
    }
    let lowered = entry.path.to_lowercase();
    ARCHIVE_SUFFIXES.iter().any(|s| lowered.ends_with(s))
}

/// 위치에서 표시용 파일명을 얻습니다 (가상 경로 우선).
///
/// `:`는 가상 경로 체인의 구분자로만 해석합니다. 실제 디스크 경로에
/// 포함된 콜론은 파일명의 일부입니다.
fn display_file_name(location: &Location) -> String {
    let leaf = match &location.virtual_path {
        Some(chain) => chain.rsplit(':').next().unwrap_or(chain),
        None => &location.real_path,
    };
    leaf.rsplit('/').next().unwrap_or(leaf).to_owned()
}

/// 중첩 엔트리의 위치를 만듭니다. 가상 경로는 `:`로 이어집니다.
fn nested_location(outer: &Location, entry_path: &str) -> Location {
    let chain = match &outer.virtual_path {
        Some(v) => format!("{v}:{entry_path}"),
        None => entry_path.to_owned(),
    };
    Location::with_virtual(outer.real_path.clone(), chain)
}

/// 확장자로 패키지 유형을 고릅니다.
fn package_type_for(file_name: &str) -> PackageType {
    let lowered = file_name.to_lowercase();
    if lowered.ends_with(".jar") || lowered.ends_with(".war") || lowered.ends_with(".ear") {
        PackageType::Java
    } else {
        PackageType::Archive
    }
}

/// 추출된 작업 공간에서 Java 매니페스트를 읽습니다.
fn read_java_manifest(root: &Path) -> Option<JavaArchiveManifest> {
    let path = root.join(JAVA_MANIFEST_PATH);
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(JavaArchiveManifest::parse(&text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read java manifest");
            None
        }
    }
}
