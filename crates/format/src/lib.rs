#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`format`]: [`Format`] trait과 canonical ID ([`FormatId`])
//! - [`registry`]: 고정 형식 집합 레지스트리 ([`FormatRegistry`])
//! - [`convert`]: 형식 간 변환 파이프라인 ([`convert::convert`])
//! - [`formats`]: 형식별 구현체
//! - [`util`]: RFC3339, XML 이스케이프, SPDX id 정규화 헬퍼

pub mod convert;
pub mod format;
pub mod formats;
pub mod registry;
pub mod util;

// --- Public API Re-exports ---

pub use convert::convert;
pub use format::{Format, FormatId};
pub use registry::FormatRegistry;
