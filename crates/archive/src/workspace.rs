//! 임시 추출 작업 공간
//!
//! 매니페스트에서 고른 엔트리만 tempfile 기반 임시 디렉토리로
//! 추출합니다. 핸들 해제는 멱등이며 Drop에서도 보장되므로, 추출이
//! 중간에 실패해도 부분 트리가 디스크에 남지 않습니다.
//!
//! # Invariants
//! - 추출 경로는 작업 공간 루트를 벗어날 수 없습니다. `..` 성분이나
//!   절대 경로 엔트리는 건너뜁니다.
//! - 엔트리당 출력은 `max_entry_size`를 넘지 않습니다 (선언 크기를
//!   믿지 않고 출력 자체를 상한으로 자름).

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use flate2::read::DeflateDecoder;
use metrics::counter;
use tempfile::TempDir;
use tracing::{debug, warn};

use packhorse_core::error::ArchiveError;
use packhorse_core::metrics::ARCHIVE_ENTRIES_EXTRACTED_TOTAL;

use crate::manifest::{ArchiveManifest, CompressionMethod, ManifestEntry};
use crate::zip::{LFH_LEN, SIG_LFH, le_u16, le_u32};

/// 추출 작업 공간 핸들
///
/// 살아있는 동안 임시 디렉토리를 소유합니다. [`release`](Self::release)는
/// 몇 번을 불러도 안전하며, 부르지 않아도 Drop에서 정리됩니다.
#[derive(Debug)]
pub struct ExtractionHandle {
    dir: Option<TempDir>,
    root: PathBuf,
}

impl ExtractionHandle {
    fn new(dir: TempDir) -> Self {
        let root = dir.path().to_path_buf();
        Self {
            dir: Some(dir),
            root,
        }
    }

    /// 작업 공간 루트 경로
    ///
    /// 해제 이후에도 경로값 자체는 유지되지만 디렉토리는 존재하지
    /// 않습니다.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 이미 해제되었는지 여부
    pub fn is_released(&self) -> bool {
        self.dir.is_none()
    }

    /// 작업 공간을 삭제합니다. 중복 호출은 no-op입니다.
    pub fn release(&mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ExtractionHandle {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            // Drop 경로에서는 실패를 전파할 수 없으므로 기록만
            if let Err(e) = dir.close() {
                warn!(error = %e, "failed to remove extraction workspace");
            }
        }
    }
}

/// 조건에 맞는 매니페스트 엔트리를 임시 작업 공간으로 추출합니다.
///
/// 엔트리의 아카이브 내 상대 경로가 작업 공간 아래에 그대로
/// 재현됩니다. 추출이 중간에 실패하면 부분 트리를 지우고 에러를
/// 반환합니다.
pub fn extract(
    archive: &Path,
    manifest: &ArchiveManifest,
    keep: impl Fn(&ManifestEntry) -> bool,
    max_entry_size: u64,
) -> Result<ExtractionHandle, ArchiveError> {
    extract_in(&std::env::temp_dir(), archive, manifest, keep, max_entry_size)
}

/// [`extract`]와 같되 작업 공간을 `parent` 아래에 만듭니다.
pub fn extract_in(
    parent: &Path,
    archive: &Path,
    manifest: &ArchiveManifest,
    keep: impl Fn(&ManifestEntry) -> bool,
    max_entry_size: u64,
) -> Result<ExtractionHandle, ArchiveError> {
    let dir = TempDir::with_prefix_in("packhorse-", parent).map_err(|e| ArchiveError::Io {
        path: archive.display().to_string(),
        source: e,
    })?;
    let handle = ExtractionHandle::new(dir);

    let mut file = File::open(archive).map_err(|e| ArchiveError::Io {
        path: archive.display().to_string(),
        source: e,
    })?;

    let mut extracted = 0u64;
    for entry in &manifest.entries {
        if entry.is_dir || !keep(entry) {
            continue;
        }
        let Some(rel) = sanitize_entry_path(&entry.path) else {
            warn!(path = %entry.path, "rejecting entry path escaping the workspace");
            continue;
        };
        if !entry.method.is_supported() {
            warn!(path = %entry.path, method = ?entry.method, "unsupported compression, skipping entry");
            continue;
        }
        if entry.size > max_entry_size {
            warn!(
                path = %entry.path,
                size = entry.size,
                limit = max_entry_size,
                "entry exceeds size limit, skipping"
            );
            continue;
        }

        extract_entry(&mut file, manifest.payload_offset, entry, &handle.root().join(rel))
            .map_err(|e| ArchiveError::ExtractionFailed {
                path: entry.path.clone(),
                source: e,
            })?;
        extracted += 1;
    }

    counter!(ARCHIVE_ENTRIES_EXTRACTED_TOTAL).increment(extracted);
    debug!(archive = %archive.display(), extracted, "extraction workspace populated");
    Ok(handle)
}

/// 엔트리 하나를 로컬 헤더 기준으로 읽어 대상 경로에 씁니다.
fn extract_entry(
    file: &mut File,
    payload_offset: u64,
    entry: &ManifestEntry,
    dest: &Path,
) -> io::Result<()> {
    let lfh_abs = payload_offset + entry.header_offset;
    file.seek(SeekFrom::Start(lfh_abs))?;
    let mut lfh = [0u8; LFH_LEN];
    file.read_exact(&mut lfh)?;
    if le_u32(&lfh[0..4]) != SIG_LFH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "bad local header signature",
        ));
    }
    let name_len = le_u16(&lfh[26..28]) as u64;
    let extra_len = le_u16(&lfh[28..30]) as u64;
    file.seek(SeekFrom::Start(lfh_abs + LFH_LEN as u64 + name_len + extra_len))?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = File::create(dest)?;

    let body = file.by_ref().take(entry.compressed_size);
    match entry.method {
        CompressionMethod::Stored => {
            io::copy(&mut body.take(entry.size), &mut out)?;
        }
        CompressionMethod::Deflate => {
            let decoder = DeflateDecoder::new(body);
            io::copy(&mut decoder.take(entry.size), &mut out)?;
        }
        CompressionMethod::Other(_) => unreachable!("filtered before extraction"),
    }
    Ok(())
}

/// 엔트리 경로를 작업 공간 상대 경로로 정규화합니다.
///
/// `..` 성분, 절대 경로, 드라이브 접두어는 `None`을 반환합니다.
pub(crate) fn sanitize_entry_path(raw: &str) -> Option<PathBuf> {
    let path = Path::new(raw);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}
