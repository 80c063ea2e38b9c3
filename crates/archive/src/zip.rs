//! zip 페이로드 위치 탐지
//!
//! zip 계열 컨테이너는 끝에서부터 읽습니다. EOCD(End of Central
//! Directory) 레코드를 스트림 꼬리의 제한된 윈도우에서 역방향으로
//! 찾고, 레코드가 선언한 중앙 디렉토리 크기/오프셋으로 실제 페이로드
//! 시작 위치를 역산합니다.
//!
//! 자가 실행 jar나 설치 스텁처럼 zip 페이로드 앞에 임의 바이트가 붙은
//! 파일도 이 역산으로 처리됩니다. 정상 zip이면 페이로드 오프셋은 0입니다.
//!
//! # Invariants
//! - 모든 크기/오프셋은 신뢰하지 않고 스트림 길이에 대해 검증합니다.
//! - EOCD 탐색은 `EOCD_SEARCH_MAX` 윈도우를 넘지 않습니다.
//!
//! # 비지원
//! - Zip64 (센티널 0xFFFF / 0xFFFF_FFFF 필드)
//! - 멀티 디스크 아카이브

use std::io::{Read, Seek, SeekFrom};

use packhorse_core::error::ArchiveError;

pub(crate) const SIG_EOCD: u32 = 0x0605_4b50;
pub(crate) const SIG_CDFH: u32 = 0x0201_4b50;
pub(crate) const SIG_LFH: u32 = 0x0403_4b50;

/// EOCD 고정 필드 길이
pub(crate) const EOCD_MIN_LEN: usize = 22;
/// EOCD 역방향 탐색 윈도우 (64 KiB 주석 + 헤더 여유분)
pub(crate) const EOCD_SEARCH_MAX: usize = 66 * 1024;

/// 중앙 디렉토리 레코드 고정 헤더 길이
pub(crate) const CDFH_LEN: usize = 46;
/// 로컬 파일 헤더 고정 길이
pub(crate) const LFH_LEN: usize = 30;

/// 파싱된 EOCD 레코드
#[derive(Debug, Clone, Copy)]
pub(crate) struct EndOfCentralDirectory {
    /// EOCD 레코드의 절대 오프셋
    pub eocd_offset: u64,
    /// 중앙 디렉토리 엔트리 수
    pub entries_total: u16,
    /// 중앙 디렉토리 크기 (바이트)
    pub cd_size: u32,
    /// 페이로드 시작 기준 중앙 디렉토리 오프셋 (선언값)
    pub cd_offset: u32,
}

/// 스트림 꼬리에서 EOCD 레코드를 찾아 파싱합니다.
///
/// 주석 안에 시그니처 바이트가 우연히 들어간 경우를 걸러내기 위해,
/// 후보 레코드의 주석 길이가 정확히 스트림 끝까지 도달하는 것만
/// 인정합니다.
pub(crate) fn find_eocd<R: Read + Seek>(
    reader: &mut R,
) -> Result<EndOfCentralDirectory, ArchiveError> {
    let stream_len = reader
        .seek(SeekFrom::End(0))
        .map_err(|e| malformed(format!("failed to seek stream end: {e}")))?;
    if stream_len < EOCD_MIN_LEN as u64 {
        return Err(malformed("stream too short to hold an end record"));
    }

    let win_len = (stream_len as usize).min(EOCD_SEARCH_MAX);
    let win_start = stream_len - win_len as u64;
    reader
        .seek(SeekFrom::Start(win_start))
        .map_err(|e| malformed(format!("failed to seek search window: {e}")))?;
    let mut win = vec![0u8; win_len];
    reader
        .read_exact(&mut win)
        .map_err(|e| malformed(format!("failed to read search window: {e}")))?;

    // 역방향 탐색: 마지막(가장 뒤쪽) 유효 후보가 진짜 EOCD
    let mut i = win_len - EOCD_MIN_LEN;
    loop {
        if le_u32(&win[i..i + 4]) == SIG_EOCD {
            let comment_len = le_u16(&win[i + 20..i + 22]) as usize;
            if i + EOCD_MIN_LEN + comment_len == win_len {
                return parse_eocd(&win[i..], win_start + i as u64);
            }
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    Err(malformed("no end-of-central-directory record in search window"))
}

fn parse_eocd(eocd: &[u8], eocd_offset: u64) -> Result<EndOfCentralDirectory, ArchiveError> {
    let disk_no = le_u16(&eocd[4..6]);
    let cd_disk = le_u16(&eocd[6..8]);
    let entries_disk = le_u16(&eocd[8..10]);
    let entries_total = le_u16(&eocd[10..12]);
    let cd_size = le_u32(&eocd[12..16]);
    let cd_offset = le_u32(&eocd[16..20]);

    if disk_no != 0 || cd_disk != 0 || entries_disk != entries_total {
        return Err(malformed("multi-disk archives are not supported"));
    }
    if entries_total == 0xFFFF || cd_size == 0xFFFF_FFFF || cd_offset == 0xFFFF_FFFF {
        return Err(malformed("zip64 archives are not supported"));
    }

    Ok(EndOfCentralDirectory {
        eocd_offset,
        entries_total,
        cd_size,
        cd_offset,
    })
}

/// 실제 zip 페이로드의 시작 오프셋을 계산합니다.
///
/// EOCD가 선언한 중앙 디렉토리 크기와 오프셋을 EOCD 절대 위치에서
/// 빼면 페이로드 시작이 나옵니다. 정상 zip은 0, 앞에 바이트가 붙은
/// 파일은 붙은 바이트 수를 반환합니다.
pub fn locate_payload<R: Read + Seek>(reader: &mut R) -> Result<u64, ArchiveError> {
    let eocd = find_eocd(reader)?;
    eocd.eocd_offset
        .checked_sub(eocd.cd_size as u64)
        .and_then(|v| v.checked_sub(eocd.cd_offset as u64))
        .ok_or_else(|| malformed("central directory lies outside the stream"))
}

fn malformed(reason: impl Into<String>) -> ArchiveError {
    ArchiveError::MalformedArchive {
        reason: reason.into(),
    }
}

#[inline(always)]
pub(crate) fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

#[inline(always)]
pub(crate) fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// 주어진 필드로 EOCD 레코드 바이트를 만듭니다.
    fn eocd_bytes(entries: u16, cd_size: u32, cd_offset: u32, comment: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIG_EOCD.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // disk no
        buf.extend_from_slice(&0u16.to_le_bytes()); // cd disk
        buf.extend_from_slice(&entries.to_le_bytes()); // entries on disk
        buf.extend_from_slice(&entries.to_le_bytes()); // entries total
        buf.extend_from_slice(&cd_size.to_le_bytes());
        buf.extend_from_slice(&cd_offset.to_le_bytes());
        buf.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        buf.extend_from_slice(comment);
        buf
    }

    #[test]
    fn empty_zip_payload_starts_at_zero() {
        let mut cursor = Cursor::new(eocd_bytes(0, 0, 0, b""));
        assert_eq!(locate_payload(&mut cursor).unwrap(), 0);
    }

    #[test]
    fn prepended_bytes_shift_payload_offset() {
        let mut data = b"#!/bin/sh\nexec java -jar $0\n".to_vec();
        let prefix_len = data.len() as u64;
        data.extend_from_slice(&eocd_bytes(0, 0, 0, b""));
        let mut cursor = Cursor::new(data);
        assert_eq!(locate_payload(&mut cursor).unwrap(), prefix_len);
    }

    #[test]
    fn eocd_with_comment_is_found() {
        let mut cursor = Cursor::new(eocd_bytes(0, 0, 0, b"built by packhorse"));
        assert_eq!(locate_payload(&mut cursor).unwrap(), 0);
    }

    #[test]
    fn fake_signature_in_comment_is_skipped() {
        // 주석 안에 EOCD 시그니처 바이트를 심어도 진짜 레코드를 찾아야 함
        let mut comment = Vec::new();
        comment.extend_from_slice(&SIG_EOCD.to_le_bytes());
        comment.extend_from_slice(&[0xFFu8; 18]);
        let mut data = vec![0xAA; 64];
        data.extend_from_slice(&eocd_bytes(0, 0, 64, &comment));
        let mut cursor = Cursor::new(data);
        assert_eq!(locate_payload(&mut cursor).unwrap(), 0);
    }

    #[test]
    fn missing_eocd_is_malformed() {
        let mut cursor = Cursor::new(vec![0u8; 4096]);
        let err = locate_payload(&mut cursor).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedArchive { .. }));
    }

    #[test]
    fn stream_shorter_than_eocd_is_malformed() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        assert!(locate_payload(&mut cursor).is_err());
    }

    #[test]
    fn central_directory_outside_stream_is_malformed() {
        // cd_size가 EOCD 앞 공간보다 큼
        let mut cursor = Cursor::new(eocd_bytes(1, 500, 0, b""));
        let err = locate_payload(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("central directory"));
    }

    #[test]
    fn zip64_sentinel_is_rejected() {
        let mut cursor = Cursor::new(eocd_bytes(0xFFFF, 0, 0, b""));
        let err = locate_payload(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("zip64"));
    }

    #[test]
    fn multi_disk_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIG_EOCD.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // disk no = 1
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        let mut cursor = Cursor::new(buf);
        let err = locate_payload(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("multi-disk"));
    }
}
