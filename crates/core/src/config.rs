//! 설정 관리 — packhorse.toml 파싱 및 런타임 설정
//!
//! [`PackhorseConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`PACKHORSE_ARCHIVE_MAX_DEPTH=3` 형식)
//! 3. 설정 파일 (`packhorse.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), packhorse_core::error::PackhorseError> {
//! use packhorse_core::config::PackhorseConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = PackhorseConfig::load("packhorse.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = PackhorseConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PackhorseError};

/// Packhorse 통합 설정
///
/// `packhorse.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackhorseConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 아카이브 카탈로거 설정
    #[serde(default)]
    pub archive: ArchiveSection,
    /// 출력 설정
    #[serde(default)]
    pub output: OutputSection,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 아카이브 카탈로거 설정 섹션
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSection {
    /// 중첩 아카이브 최대 재귀 깊이
    pub max_depth: u32,
    /// 아카이브당 최대 엔트리 수
    pub max_entries: usize,
    /// 추출 엔트리당 최대 크기 (바이트, 압축 해제 기준)
    pub max_entry_size: u64,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_entries: 65_535,
            max_entry_size: 1024 * 1024 * 1024, // 1 GiB
        }
    }
}

/// 출력 설정 섹션
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// 기본 출력 형식 이름/별칭
    pub format: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            format: "packhorse-json".to_owned(),
        }
    }
}

impl PackhorseConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PackhorseError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, PackhorseError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PackhorseError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                PackhorseError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, PackhorseError> {
        toml::from_str(toml_str).map_err(|e| {
            PackhorseError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `PACKHORSE_{SECTION}_{FIELD}`
    /// 예: `PACKHORSE_ARCHIVE_MAX_DEPTH=3`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "PACKHORSE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "PACKHORSE_GENERAL_LOG_FORMAT");

        // Archive
        override_u32(&mut self.archive.max_depth, "PACKHORSE_ARCHIVE_MAX_DEPTH");
        override_usize(&mut self.archive.max_entries, "PACKHORSE_ARCHIVE_MAX_ENTRIES");
        override_u64(
            &mut self.archive.max_entry_size,
            "PACKHORSE_ARCHIVE_MAX_ENTRY_SIZE",
        );

        // Output
        override_string(&mut self.output.format, "PACKHORSE_OUTPUT_FORMAT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PackhorseError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.archive.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "archive.max_entries".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.archive.max_entry_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "archive.max_entry_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.output.format.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.format".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *target = value;
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                tracing::warn!(env = env_key, value = %value, "ignoring unparsable env override");
            }
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                tracing::warn!(env = env_key, value = %value, "ignoring unparsable env override");
            }
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                tracing::warn!(env = env_key, value = %value, "ignoring unparsable env override");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PackhorseConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn parse_minimal_toml() {
        let config = PackhorseConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.archive.max_depth, 5);
        assert_eq!(config.output.format, "packhorse-json");
    }

    #[test]
    fn parse_overrides_sections() {
        let toml_str = r#"
            [general]
            log_level = "debug"
            log_format = "json"

            [archive]
            max_depth = 2
            max_entries = 100
            max_entry_size = 4096

            [output]
            format = "spdx-json"
        "#;
        let config = PackhorseConfig::parse(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.archive.max_depth, 2);
        assert_eq!(config.archive.max_entries, 100);
        assert_eq!(config.output.format, "spdx-json");
    }

    #[test]
    fn parse_rejects_invalid_toml() {
        let result = PackhorseConfig::parse("[general\nlog_level=");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_unknown_log_level() {
        let mut config = PackhorseConfig::default();
        config.general.log_level = "verbose".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_log_format() {
        let mut config = PackhorseConfig::default();
        config.general.log_format = "xml".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_entries() {
        let mut config = PackhorseConfig::default();
        config.archive.max_entries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_output_format() {
        let mut config = PackhorseConfig::default();
        config.output.format = String::new();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn from_file_reports_missing_file() {
        let result = PackhorseConfig::from_file("/nonexistent/packhorse.toml").await;
        assert!(matches!(
            result,
            Err(PackhorseError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn from_file_loads_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packhorse.toml");
        tokio::fs::write(&path, "[archive]\nmax_depth = 1")
            .await
            .unwrap();
        let config = PackhorseConfig::from_file(&path).await.unwrap();
        assert_eq!(config.archive.max_depth, 1);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = PackhorseConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = PackhorseConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.archive.max_depth, config.archive.max_depth);
        assert_eq!(parsed.output.format, config.output.format);
    }
}
