//! 아카이브 카탈로거 설정
//!
//! [`ArchiveConfig`]는 core 설정의 `[archive]` 섹션
//! ([`ArchiveSection`](packhorse_core::config::ArchiveSection))에서
//! 파생됩니다.
//!
//! # 사용 예시
//!
//! ```
//! use packhorse_archive::ArchiveConfig;
//!
//! let config = ArchiveConfig::default();
//! config.validate().unwrap();
//! ```

use serde::{Deserialize, Serialize};

use packhorse_core::config::ArchiveSection;
use packhorse_core::error::{ConfigError, PackhorseError};

/// 설정 상한값 상수
const MAX_DEPTH_LIMIT: u32 = 16;
const MAX_ENTRIES_LIMIT: usize = 1_000_000;

/// 아카이브 카탈로거 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// 중첩 아카이브 최대 재귀 깊이 (0이면 최상위만)
    pub max_depth: u32,
    /// 아카이브당 처리할 최대 엔트리 수
    pub max_entries: usize,
    /// 추출 엔트리당 최대 크기 (바이트, 압축 해제 기준)
    pub max_entry_size: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self::from(&ArchiveSection::default())
    }
}

impl From<&ArchiveSection> for ArchiveConfig {
    fn from(section: &ArchiveSection) -> Self {
        Self {
            max_depth: section.max_depth,
            max_entries: section.max_entries,
            max_entry_size: section.max_entry_size,
        }
    }
}

impl ArchiveConfig {
    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PackhorseError> {
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "archive.max_depth".to_owned(),
                reason: format!("must be at most {MAX_DEPTH_LIMIT}"),
            }
            .into());
        }
        if self.max_entries == 0 || self.max_entries > MAX_ENTRIES_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "archive.max_entries".to_owned(),
                reason: format!("must be between 1 and {MAX_ENTRIES_LIMIT}"),
            }
            .into());
        }
        if self.max_entry_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "archive.max_entry_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }
        Ok(())
    }
}
