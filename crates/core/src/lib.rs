#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ArchiveError, ConfigError, FormatError, PackhorseError};

// 설정
pub use config::PackhorseConfig;

// 정준 모델
pub use types::{
    Location, Package, PackageMetadata, PackageType, Relationship, RelationshipKind, Sbom,
    SourceDescriptor, SourceScheme, ToolDescriptor,
};

// 확장 지점
pub use catalog::{Cataloger, run_catalogers};
pub use resolver::{DirectoryResolver, FileResolver};
