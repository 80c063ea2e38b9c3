//! 아카이브 카탈로거 통합 테스트
//!
//! zip crate로 실제 아카이브 픽스처를 만들어 탐지 → 매니페스트 →
//! 추출 → 재귀 파이프라인 전체를 검증합니다.

use std::io::Write;

use zip::write::SimpleFileOptions;

use packhorse_archive::{ArchiveCataloger, ArchiveConfig};
use packhorse_core::catalog::Cataloger;
use packhorse_core::resolver::DirectoryResolver;
use packhorse_core::types::{PackageMetadata, PackageType, RelationshipKind};

/// 메모리에서 zip 바이트를 만듭니다.
fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(cursor);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn write_file(dir: &std::path::Path, name: &str, bytes: &[u8]) {
    std::fs::write(dir.join(name), bytes).unwrap();
}

fn catalog_dir(dir: &std::path::Path, config: ArchiveConfig) -> (Vec<packhorse_core::types::Package>, Vec<packhorse_core::types::Relationship>) {
    let cataloger = ArchiveCataloger::new(config);
    let resolver = DirectoryResolver::new(dir);
    cataloger.catalog(&resolver).unwrap()
}

#[test]
fn jar_with_manifest_yields_named_package() {
    let dir = tempfile::tempdir().unwrap();
    let jar = zip_bytes(&[(
        "META-INF/MANIFEST.MF",
        b"Manifest-Version: 1.0\r\nImplementation-Title: demo-lib\r\nImplementation-Version: 2.5.0\r\n".as_slice(),
    )]);
    write_file(dir.path(), "demo.jar", &jar);

    let (packages, relationships) = catalog_dir(dir.path(), ArchiveConfig::default());
    assert_eq!(packages.len(), 1);
    assert!(relationships.is_empty());

    let pkg = &packages[0];
    assert_eq!(pkg.name, "demo-lib");
    assert_eq!(pkg.version, "2.5.0");
    assert_eq!(pkg.package_type, PackageType::Java);
    assert!(matches!(
        pkg.metadata,
        PackageMetadata::JavaManifest {
            ref implementation_title,
            ..
        } if implementation_title.as_deref() == Some("demo-lib")
    ));
}

#[test]
fn filename_fallback_without_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let jar = zip_bytes(&[("com/example/App.class", b"\xCA\xFE\xBA\xBE".as_slice())]);
    write_file(dir.path(), "spring-core-5.3.21.jar", &jar);

    let (packages, _) = catalog_dir(dir.path(), ArchiveConfig::default());
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "spring-core");
    assert_eq!(packages[0].version, "5.3.21");
}

#[test]
fn nested_archive_emits_containment() {
    let dir = tempfile::tempdir().unwrap();
    let inner = zip_bytes(&[(
        "META-INF/MANIFEST.MF",
        b"Implementation-Title: inner-lib\r\nImplementation-Version: 1.0\r\n".as_slice(),
    )]);
    let outer = zip_bytes(&[("lib/inner-1.0.jar", inner.as_slice())]);
    write_file(dir.path(), "bundle.zip", &outer);

    let (packages, relationships) = catalog_dir(dir.path(), ArchiveConfig::default());
    assert_eq!(packages.len(), 2);

    let outer_pkg = packages.iter().find(|p| p.name == "bundle").unwrap();
    let inner_pkg = packages.iter().find(|p| p.name == "inner-lib").unwrap();
    assert_eq!(outer_pkg.package_type, PackageType::Archive);
    assert_eq!(inner_pkg.package_type, PackageType::Java);
    assert_eq!(
        inner_pkg.locations[0].virtual_path.as_deref(),
        Some("lib/inner-1.0.jar")
    );

    assert_eq!(relationships.len(), 1);
    let rel = &relationships[0];
    assert_eq!(rel.kind, RelationshipKind::ContainedBy);
    assert_eq!(rel.from, inner_pkg.id);
    assert_eq!(rel.to, outer_pkg.id);
}

#[test]
fn prepended_bytes_do_not_change_results() {
    let jar = zip_bytes(&[(
        "META-INF/MANIFEST.MF",
        b"Implementation-Title: shifty\r\nImplementation-Version: 3.1\r\n".as_slice(),
    )]);

    let plain_dir = tempfile::tempdir().unwrap();
    write_file(plain_dir.path(), "shifty.jar", &jar);

    let stub_dir = tempfile::tempdir().unwrap();
    let mut prefixed = b"#!/bin/sh\nexec java -jar \"$0\" \"$@\"\n".to_vec();
    prefixed.extend_from_slice(&jar);
    write_file(stub_dir.path(), "shifty.jar", &prefixed);

    let (plain, _) = catalog_dir(plain_dir.path(), ArchiveConfig::default());
    let (shifted, _) = catalog_dir(stub_dir.path(), ArchiveConfig::default());
    assert_eq!(plain.len(), 1);
    assert_eq!(shifted.len(), 1);
    assert_eq!(plain[0].name, shifted[0].name);
    assert_eq!(plain[0].version, shifted[0].version);
    assert_eq!(plain[0].metadata, shifted[0].metadata);
}

#[test]
fn recursion_budget_zero_reports_only_top_level() {
    let dir = tempfile::tempdir().unwrap();
    let inner = zip_bytes(&[("x.txt", b"x".as_slice())]);
    let outer = zip_bytes(&[("inner.jar", inner.as_slice())]);
    write_file(dir.path(), "outer.zip", &outer);

    let config = ArchiveConfig {
        max_depth: 0,
        ..ArchiveConfig::default()
    };
    let (packages, relationships) = catalog_dir(dir.path(), config);
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "outer");
    assert!(relationships.is_empty());
}

#[test]
fn recursion_stops_at_budget_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let innermost = zip_bytes(&[("x.txt", b"x".as_slice())]);
    let mid = zip_bytes(&[("innermost.jar", innermost.as_slice())]);
    let outer = zip_bytes(&[("mid-1.0.jar", mid.as_slice())]);
    write_file(dir.path(), "outer.zip", &outer);

    let config = ArchiveConfig {
        max_depth: 1,
        ..ArchiveConfig::default()
    };
    let (packages, relationships) = catalog_dir(dir.path(), config);
    // outer + mid, innermost는 예산 밖
    assert_eq!(packages.len(), 2);
    assert_eq!(relationships.len(), 1);
    assert!(packages.iter().any(|p| p.name == "mid"));
    assert!(!packages.iter().any(|p| p.name == "innermost"));
}

#[test]
fn corrupt_archive_is_skipped_without_failing_scan() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "broken.zip", b"this is not a zip at all");
    let jar = zip_bytes(&[("a.txt", b"x".as_slice())]);
    write_file(dir.path(), "fine-1.0.jar", &jar);

    let (packages, _) = catalog_dir(dir.path(), ArchiveConfig::default());
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "fine");
}

#[test]
fn non_archive_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "notes.txt", b"hello");
    write_file(dir.path(), "data.json", b"{}");

    let (packages, relationships) = catalog_dir(dir.path(), ArchiveConfig::default());
    assert!(packages.is_empty());
    assert!(relationships.is_empty());
}
