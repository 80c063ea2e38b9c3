//! 파일 리졸버 — 논리적 위치로 파일을 찾고 여는 확장 지점
//!
//! [`FileResolver`] trait은 카탈로거가 파일에 접근하는 유일한 통로입니다.
//! 코어는 위치가 실제 디스크 경로라고 가정하지 않으며, 이미지 레이어 등
//! 가상화된 리졸버에 대해서도 동작해야 합니다.
//!
//! [`DirectoryResolver`]는 로컬 디렉토리 트리에 대한 기본 구현체입니다.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::PackhorseError;
use crate::types::Location;

/// 디렉토리 재귀 탐색 깊이 상한
const MAX_WALK_DEPTH: u32 = 32;

/// 파일 리졸버 trait
///
/// 카탈로거에 파일 접근 능력을 제공합니다.
pub trait FileResolver: Send + Sync {
    /// 위치의 내용을 읽기 스트림으로 엽니다.
    fn open_by_location(&self, location: &Location) -> Result<Box<dyn Read + Send>, PackhorseError>;

    /// 실제 디스크 경로가 필요한 도구를 위해 경로를 반환합니다.
    ///
    /// 가상 리졸버는 `None`을 반환할 수 있으며, 호출자는 그 경우
    /// [`open_by_location`](Self::open_by_location)으로 내용을 복사해
    /// 사용해야 합니다.
    fn access_path(&self, location: &Location) -> Option<PathBuf>;

    /// 주어진 접미사 중 하나로 끝나는 파일 위치를 모두 나열합니다.
    ///
    /// 접미사 비교는 대소문자를 구분하지 않습니다.
    fn files_by_suffix(&self, suffixes: &[&str]) -> Result<Vec<Location>, PackhorseError>;
}

/// 로컬 디렉토리 트리 리졸버
///
/// 루트 아래를 재귀 탐색합니다. 읽을 수 없는 엔트리는 경고 후 건너뜁니다.
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    /// 루트 디렉토리에 대한 리졸버를 생성합니다.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 리졸버의 루트 경로를 반환합니다.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(
        &self,
        dir: &Path,
        depth: u32,
        suffixes: &[String],
        results: &mut Vec<Location>,
    ) {
        if depth > MAX_WALK_DEPTH {
            warn!(dir = %dir.display(), "directory tree too deep, stopping walk");
            return;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read directory, skipping");
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "failed to read directory entry, skipping");
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to stat entry, skipping");
                    continue;
                }
            };

            // 심볼릭 링크는 따라가지 않음 (루트 밖 탈출 방지)
            if file_type.is_symlink() {
                continue;
            }

            if file_type.is_dir() {
                self.walk(&path, depth + 1, suffixes, results);
                continue;
            }

            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_lowercase(),
                None => continue,
            };
            if suffixes.iter().any(|s| name.ends_with(s)) {
                results.push(Location::new(path.display().to_string()));
            }
        }
    }
}

impl FileResolver for DirectoryResolver {
    fn open_by_location(&self, location: &Location) -> Result<Box<dyn Read + Send>, PackhorseError> {
        let file = File::open(&location.real_path).map_err(PackhorseError::Io)?;
        Ok(Box::new(file))
    }

    fn access_path(&self, location: &Location) -> Option<PathBuf> {
        let path = PathBuf::from(&location.real_path);
        if path.exists() { Some(path) } else { None }
    }

    fn files_by_suffix(&self, suffixes: &[&str]) -> Result<Vec<Location>, PackhorseError> {
        let lowered: Vec<String> = suffixes.iter().map(|s| s.to_lowercase()).collect();
        let mut results = Vec::new();
        self.walk(&self.root, 0, &lowered, &mut results);
        // 탐색 순서는 파일시스템 의존적이므로 여기서 고정
        results.sort_by(|a, b| a.real_path.cmp(&b.real_path));
        Ok(results)
    }
}
