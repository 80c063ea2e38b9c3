//! 중앙 디렉토리 기반 아카이브 매니페스트
//!
//! zip의 중앙 디렉토리만 순차로 읽어 엔트리 목록을 만듭니다.
//! 엔트리 본문은 전혀 압축 해제하지 않으므로 엔트리 수에 선형인
//! 시간으로 동작합니다.
//!
//! 중복 경로는 먼저 나온 레코드가 이깁니다. 레코드가 선언한 길이가
//! 중앙 디렉토리 경계를 벗어나면 [`ArchiveError::CorruptManifest`]로
//! 실패하며, 문제 레코드의 절대 오프셋을 함께 보고합니다.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use packhorse_core::error::ArchiveError;

use crate::zip::{self, CDFH_LEN, SIG_CDFH, le_u16, le_u32};

/// 엔트리 압축 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// 무압축 (method 0)
    Stored,
    /// deflate (method 8)
    Deflate,
    /// 그 외 (추출 비지원)
    Other(u16),
}

impl CompressionMethod {
    fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Stored,
            8 => Self::Deflate,
            other => Self::Other(other),
        }
    }

    /// 추출 가능한 방식인지 여부
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Stored | Self::Deflate)
    }
}

/// 중앙 디렉토리 한 레코드에서 읽은 엔트리 정보
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    /// 아카이브 내 경로 (레코드 그대로)
    pub path: String,
    /// 압축 해제 기준 크기 (바이트)
    pub size: u64,
    /// 압축된 크기 (바이트)
    pub compressed_size: u64,
    /// 페이로드 시작 기준 로컬 헤더 오프셋
    pub header_offset: u64,
    /// 압축 방식
    pub method: CompressionMethod,
    /// 디렉토리 엔트리 여부
    pub is_dir: bool,
}

/// 아카이브 엔트리 매니페스트
///
/// [`read_manifest`]로 생성되며 생성 후 불변입니다.
#[derive(Debug)]
pub struct ArchiveManifest {
    /// 페이로드 시작 절대 오프셋
    pub payload_offset: u64,
    /// 중앙 디렉토리 순서의 엔트리 목록 (중복 경로는 첫 레코드만)
    pub entries: Vec<ManifestEntry>,
}

impl ArchiveManifest {
    /// 엔트리 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 엔트리가 없으면 true
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 정확히 일치하는 경로의 엔트리를 찾습니다.
    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}

/// 파일의 중앙 디렉토리를 읽어 매니페스트를 만듭니다.
///
/// `payload_offset`은 [`locate_payload`](crate::zip::locate_payload)가
/// 계산한 값이어야 합니다.
pub fn read_manifest(path: &Path, payload_offset: u64) -> Result<ArchiveManifest, ArchiveError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let eocd = zip::find_eocd(&mut file)?;

    let cd_abs = payload_offset + eocd.cd_offset as u64;
    let cd_size = eocd.cd_size as u64;
    if cd_abs + cd_size > eocd.eocd_offset {
        return Err(ArchiveError::CorruptManifest {
            offset: cd_abs,
            reason: "central directory overruns its end record".to_owned(),
        });
    }

    file.seek(SeekFrom::Start(cd_abs)).map_err(|e| io_err(path, e))?;
    let mut cd = vec![0u8; cd_size as usize];
    file.read_exact(&mut cd).map_err(|e| io_err(path, e))?;

    let mut entries = Vec::with_capacity(eocd.entries_total as usize);
    let mut seen: HashSet<String> = HashSet::new();
    let mut pos = 0usize;

    for _ in 0..eocd.entries_total {
        let record_abs = cd_abs + pos as u64;
        if pos + CDFH_LEN > cd.len() {
            return Err(ArchiveError::CorruptManifest {
                offset: record_abs,
                reason: "truncated central directory record".to_owned(),
            });
        }
        let rec = &cd[pos..];
        if le_u32(&rec[0..4]) != SIG_CDFH {
            return Err(ArchiveError::CorruptManifest {
                offset: record_abs,
                reason: "bad central directory signature".to_owned(),
            });
        }

        let method = le_u16(&rec[10..12]);
        let compressed_size = le_u32(&rec[20..24]) as u64;
        let size = le_u32(&rec[24..28]) as u64;
        let name_len = le_u16(&rec[28..30]) as usize;
        let extra_len = le_u16(&rec[30..32]) as usize;
        let comment_len = le_u16(&rec[32..34]) as usize;
        let header_offset = le_u32(&rec[42..46]) as u64;

        let record_len = CDFH_LEN + name_len + extra_len + comment_len;
        if pos + record_len > cd.len() {
            return Err(ArchiveError::CorruptManifest {
                offset: record_abs,
                reason: "record lengths run past central directory end".to_owned(),
            });
        }

        let name = String::from_utf8_lossy(&rec[CDFH_LEN..CDFH_LEN + name_len]).into_owned();
        pos += record_len;

        if seen.contains(&name) {
            debug!(path = %name, "duplicate manifest entry, keeping first");
            continue;
        }
        seen.insert(name.clone());

        let is_dir = name.ends_with('/');
        entries.push(ManifestEntry {
            path: name,
            size,
            compressed_size,
            header_offset,
            method: CompressionMethod::from_raw(method),
            is_dir,
        });
    }

    Ok(ArchiveManifest {
        payload_offset,
        entries,
    })
}

fn io_err(path: &Path, source: std::io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// 중앙 디렉토리 레코드 바이트를 만듭니다.
    fn cdfh(name: &str, method: u16, compressed: u32, uncompressed: u32, lho: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIG_CDFH.to_le_bytes());
        buf.extend_from_slice(&[0u8; 6]); // versions, flags
        buf.extend_from_slice(&method.to_le_bytes());
        buf.extend_from_slice(&[0u8; 8]); // mtime, mdate, crc
        buf.extend_from_slice(&compressed.to_le_bytes());
        buf.extend_from_slice(&uncompressed.to_le_bytes());
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra len
        buf.extend_from_slice(&0u16.to_le_bytes()); // comment len
        buf.extend_from_slice(&[0u8; 8]); // disk, attrs
        buf.extend_from_slice(&lho.to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf
    }

    fn eocd(entries: u16, cd_size: u32, cd_offset: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&crate::zip::SIG_EOCD.to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]); // disk numbers
        buf.extend_from_slice(&entries.to_le_bytes());
        buf.extend_from_slice(&entries.to_le_bytes());
        buf.extend_from_slice(&cd_size.to_le_bytes());
        buf.extend_from_slice(&cd_offset.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // comment len
        buf
    }

    /// 중앙 디렉토리와 EOCD만 있는 파일을 만듭니다 (본문 없음).
    fn write_archive(records: &[Vec<u8>]) -> tempfile::NamedTempFile {
        let cd: Vec<u8> = records.concat();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&cd).unwrap();
        file.write_all(&eocd(records.len() as u16, cd.len() as u32, 0))
            .unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_entries_in_order() {
        let file = write_archive(&[
            cdfh("META-INF/MANIFEST.MF", 8, 100, 300, 0),
            cdfh("lib/inner.jar", 0, 500, 500, 200),
        ]);
        let manifest = read_manifest(file.path(), 0).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries[0].path, "META-INF/MANIFEST.MF");
        assert_eq!(manifest.entries[0].method, CompressionMethod::Deflate);
        assert_eq!(manifest.entries[0].size, 300);
        assert_eq!(manifest.entries[1].header_offset, 200);
        assert_eq!(manifest.entries[1].method, CompressionMethod::Stored);
    }

    #[test]
    fn duplicate_paths_keep_first() {
        let file = write_archive(&[
            cdfh("a.txt", 0, 10, 10, 0),
            cdfh("a.txt", 0, 20, 20, 50),
        ]);
        let manifest = read_manifest(file.path(), 0).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries[0].size, 10);
    }

    #[test]
    fn directory_entries_are_flagged() {
        let file = write_archive(&[cdfh("META-INF/", 0, 0, 0, 0)]);
        let manifest = read_manifest(file.path(), 0).unwrap();
        assert!(manifest.entries[0].is_dir);
    }

    #[test]
    fn get_finds_exact_path() {
        let file = write_archive(&[cdfh("lib/util.jar", 0, 1, 1, 0)]);
        let manifest = read_manifest(file.path(), 0).unwrap();
        assert!(manifest.get("lib/util.jar").is_some());
        assert!(manifest.get("lib/util").is_none());
    }

    #[test]
    fn bad_signature_is_corrupt() {
        let mut bad = cdfh("x", 0, 0, 0, 0);
        bad[0] = 0x00;
        let file = write_archive(&[bad]);
        let err = read_manifest(file.path(), 0).unwrap_err();
        assert!(matches!(err, ArchiveError::CorruptManifest { .. }));
    }

    #[test]
    fn name_running_past_end_is_corrupt() {
        // name_len이 실제 기록된 이름보다 크게 선언됨
        let mut bad = cdfh("short", 0, 0, 0, 0);
        bad[28..30].copy_from_slice(&1000u16.to_le_bytes());
        let file = write_archive(&[bad]);
        let err = read_manifest(file.path(), 0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("run past"), "unexpected error: {msg}");
    }

    #[test]
    fn entry_count_beyond_directory_is_corrupt() {
        let record = cdfh("only.txt", 0, 0, 0, 0);
        let cd_len = record.len() as u32;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&record).unwrap();
        // EOCD가 실제보다 많은 엔트리를 선언
        file.write_all(&eocd(3, cd_len, 0)).unwrap();
        file.flush().unwrap();
        let err = read_manifest(file.path(), 0).unwrap_err();
        assert!(matches!(err, ArchiveError::CorruptManifest { .. }));
    }

    #[test]
    fn prepended_bytes_offset_is_honoured() {
        let record = cdfh("a.txt", 0, 4, 4, 0);
        let cd_len = record.len() as u32;
        let prefix = b"stub-loader:";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(prefix).unwrap();
        file.write_all(&record).unwrap();
        file.write_all(&eocd(1, cd_len, 0)).unwrap();
        file.flush().unwrap();

        let manifest = read_manifest(file.path(), prefix.len() as u64).unwrap();
        assert_eq!(manifest.payload_offset, prefix.len() as u64);
        assert_eq!(manifest.entries[0].path, "a.txt");
    }
}
