#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`zip`]: EOCD 탐색 및 페이로드 오프셋 계산 (`locate_payload`)
//! - [`manifest`]: 중앙 디렉토리 기반 매니페스트 리더 (`ArchiveManifest`)
//! - [`workspace`]: 임시 추출 작업 공간 (`ExtractionHandle`, `extract`)
//! - [`java`]: Java 아카이브 메타데이터 (`MANIFEST.MF`, 파일명 파싱)
//! - [`cataloger`]: 중첩 아카이브 카탈로거 (`ArchiveCataloger`)
//! - [`config`]: 카탈로거 설정 (`ArchiveConfig`)
//!
//! # Architecture
//!
//! ```text
//! resolver (*.zip, *.jar, ...) --> locate_payload --> read_manifest
//!                                                         |
//!                                                      extract
//!                                                         |
//!                              +--------------------------+-----------+
//!                              |                                      |
//!                       MANIFEST.MF parsing                  nested archives
//!                              |                                      |
//!                      Package metadata                  recurse (budget - 1)
//! ```

pub mod cataloger;
pub mod config;
pub mod java;
pub mod manifest;
pub mod workspace;
pub mod zip;

// --- Public API Re-exports ---

pub use cataloger::ArchiveCataloger;
pub use config::ArchiveConfig;
pub use java::JavaArchiveManifest;
pub use manifest::{ArchiveManifest, CompressionMethod, ManifestEntry};
pub use workspace::{ExtractionHandle, extract, extract_in};
pub use zip::locate_payload;
