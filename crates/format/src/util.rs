//! 형식 구현 공유 헬퍼
//!
//! RFC3339 타임스탬프, XML 이스케이프, SPDX id 정규화 등 여러 형식이
//! 같이 쓰는 작은 함수들입니다.

/// 현재 시각을 RFC3339 형식으로 반환합니다.
///
/// 시스템 시간을 가져올 수 없는 경우 epoch를 반환합니다.
pub fn current_timestamp() -> String {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => unix_to_rfc3339(duration.as_secs()),
        Err(_) => "1970-01-01T00:00:00Z".to_owned(),
    }
}

/// Unix timestamp를 RFC3339 형식 (YYYY-MM-DDTHH:MM:SSZ)으로 변환합니다.
pub fn unix_to_rfc3339(secs: u64) -> String {
    const SECONDS_PER_DAY: u64 = 86400;
    const SECONDS_PER_HOUR: u64 = 3600;
    const SECONDS_PER_MINUTE: u64 = 60;

    let days_since_epoch = secs / SECONDS_PER_DAY;
    let remaining_secs = secs % SECONDS_PER_DAY;

    let hours = remaining_secs / SECONDS_PER_HOUR;
    let minutes = (remaining_secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = remaining_secs % SECONDS_PER_MINUTE;

    let mut year = 1970;
    let mut days = days_since_epoch;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if days >= days_in_year {
            days -= days_in_year;
            year += 1;
        } else {
            break;
        }
    }

    let days_in_months: [u64; 12] = if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 1;
    let mut day = days + 1;

    for &days_in_month in &days_in_months {
        if day <= days_in_month {
            break;
        }
        day -= days_in_month;
        month += 1;
    }

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year, month, day, hours, minutes, seconds
    )
}

/// 윤년 판별
fn is_leap_year(year: u64) -> bool {
    (year.is_multiple_of(4) && !year.is_multiple_of(100)) || year.is_multiple_of(400)
}

/// XML 텍스트/속성값 이스케이프
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// XML 이스케이프를 되돌립니다 (다섯 가지 기본 엔티티만).
pub fn xml_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// 패키지의 결정론적 SPDX 식별자를 만듭니다.
///
/// SPDX id는 영숫자와 `.`, `-`만 허용하므로 나머지는 `-`로 바꿉니다.
pub fn spdx_id_for(name: &str, version: &str) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    };
    if version.is_empty() {
        format!("SPDXRef-Package-{}", clean(name))
    } else {
        format!("SPDXRef-Package-{}-{}", clean(name), clean(version))
    }
}

/// `real:virtual` 표시 문자열에서 위치를 복원합니다.
///
/// [`Location`](packhorse_core::types::Location)의 `Display` 역연산입니다.
/// 가상 경로 체인에 포함된 콜론은 그대로 유지됩니다.
pub fn location_from_display(value: &str) -> packhorse_core::types::Location {
    use packhorse_core::types::Location;
    match value.split_once(':') {
        Some((real, virt)) => Location::with_virtual(real, virt),
        None => Location::new(value),
    }
}

/// purl 문자열에서 타입 부분을 꺼냅니다 (`pkg:maven/x@1` → `maven`).
pub fn purl_ecosystem(purl: &str) -> Option<&str> {
    purl.strip_prefix("pkg:")?.split('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_epoch() {
        assert_eq!(unix_to_rfc3339(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn rfc3339_known_date() {
        // 2024-01-01T00:00:00Z = 1704067200 seconds
        assert_eq!(unix_to_rfc3339(1704067200), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn rfc3339_leap_day() {
        // 2024-02-29T12:00:00Z = 1709208000 seconds
        assert_eq!(unix_to_rfc3339(1709208000), "2024-02-29T12:00:00Z");
    }

    #[test]
    fn leap_year_rules() {
        assert!(is_leap_year(2000)); // divisible by 400
        assert!(is_leap_year(2024)); // divisible by 4, not by 100
        assert!(!is_leap_year(1900)); // divisible by 100, not by 400
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn current_timestamp_shape() {
        let ts = current_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), 20);
    }

    #[test]
    fn xml_escape_round_trip() {
        let raw = r#"a<b>&"c'"#;
        assert_eq!(xml_unescape(&xml_escape(raw)), raw);
    }

    #[test]
    fn spdx_id_replaces_forbidden_chars() {
        assert_eq!(
            spdx_id_for("org/lib", "1.0+build"),
            "SPDXRef-Package-org-lib-1.0-build"
        );
        assert_eq!(spdx_id_for("plain", ""), "SPDXRef-Package-plain");
    }

    #[test]
    fn purl_ecosystem_extraction() {
        assert_eq!(purl_ecosystem("pkg:maven/core@1.0"), Some("maven"));
        assert_eq!(purl_ecosystem("not-a-purl"), None);
    }
}
