//! Java 아카이브 메타데이터
//!
//! `META-INF/MANIFEST.MF` 형식의 key: value 매니페스트를 파싱하고,
//! 매니페스트가 없을 때 파일명(`name-1.2.3.jar`)에서 이름과 버전을
//! 추정합니다.

/// `MANIFEST.MF`에서 읽은 구현 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JavaArchiveManifest {
    /// Implementation-Title
    pub implementation_title: Option<String>,
    /// Implementation-Version
    pub implementation_version: Option<String>,
    /// Implementation-Vendor
    pub implementation_vendor: Option<String>,
}

impl JavaArchiveManifest {
    /// 매니페스트 텍스트를 파싱합니다.
    ///
    /// JAR 명세의 연속 줄(한 칸 공백으로 시작하는 줄은 직전 값에
    /// 이어붙임)을 지원하며, 관심 없는 키는 무시합니다.
    pub fn parse(text: &str) -> Self {
        let mut manifest = Self::default();
        let mut current: Option<(String, String)> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim_end_matches('\r');
            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(continuation);
                }
                continue;
            }
            if let Some((key, value)) = current.take() {
                manifest.assign(&key, value);
            }
            if let Some((key, value)) = line.split_once(':') {
                current = Some((key.trim().to_owned(), value.trim().to_owned()));
            }
        }
        if let Some((key, value)) = current.take() {
            manifest.assign(&key, value);
        }
        manifest
    }

    fn assign(&mut self, key: &str, value: String) {
        if value.is_empty() {
            return;
        }
        match key.to_ascii_lowercase().as_str() {
            "implementation-title" => self.implementation_title = Some(value),
            "implementation-version" => self.implementation_version = Some(value),
            "implementation-vendor" => self.implementation_vendor = Some(value),
            _ => {}
        }
    }

    /// 쓸만한 필드가 하나라도 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.implementation_title.is_none()
            && self.implementation_version.is_none()
            && self.implementation_vendor.is_none()
    }
}

/// 아카이브 확장자 목록 (파일명 추정 시 제거)
const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".jar", ".war", ".ear"];

/// 파일명에서 패키지 이름과 버전을 추정합니다.
///
/// `spring-core-5.3.21.jar` → `("spring-core", Some("5.3.21"))`.
/// 버전 구분은 숫자로 시작하는 마지막 `-` 뒷부분으로 판단하며,
/// 버전처럼 보이는 부분이 없으면 전체 어간을 이름으로 씁니다.
pub fn name_and_version_from_filename(file_name: &str) -> (String, Option<String>) {
    let mut stem = file_name;
    for ext in ARCHIVE_EXTENSIONS {
        if let Some(stripped) = strip_suffix_ignore_case(stem, ext) {
            stem = stripped;
            break;
        }
    }

    let mut split_at = None;
    for (idx, _) in stem.match_indices('-') {
        if stem[idx + 1..].chars().next().is_some_and(|c| c.is_ascii_digit()) {
            split_at = Some(idx);
        }
    }

    match split_at {
        Some(idx) => (stem[..idx].to_owned(), Some(stem[idx + 1..].to_owned())),
        None => (stem.to_owned(), None),
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() >= suffix.len() && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix) {
        Some(&s[..s.len() - suffix.len()])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_implementation_fields() {
        let text = "Manifest-Version: 1.0\r\n\
                    Implementation-Title: spring-core\r\n\
                    Implementation-Version: 5.3.21\r\n\
                    Implementation-Vendor: Pivotal\r\n";
        let manifest = JavaArchiveManifest::parse(text);
        assert_eq!(manifest.implementation_title.as_deref(), Some("spring-core"));
        assert_eq!(manifest.implementation_version.as_deref(), Some("5.3.21"));
        assert_eq!(manifest.implementation_vendor.as_deref(), Some("Pivotal"));
    }

    #[test]
    fn continuation_lines_are_joined() {
        let text = "Implementation-Title: a-very-long\n title-name\n";
        let manifest = JavaArchiveManifest::parse(text);
        assert_eq!(
            manifest.implementation_title.as_deref(),
            Some("a-very-longtitle-name")
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let manifest = JavaArchiveManifest::parse("Created-By: javac\nMain-Class: App\n");
        assert!(manifest.is_empty());
    }

    #[test]
    fn empty_values_stay_unset() {
        let manifest = JavaArchiveManifest::parse("Implementation-Title:\n");
        assert!(manifest.implementation_title.is_none());
    }

    #[test]
    fn filename_with_version_splits() {
        let (name, version) = name_and_version_from_filename("spring-core-5.3.21.jar");
        assert_eq!(name, "spring-core");
        assert_eq!(version.as_deref(), Some("5.3.21"));
    }

    #[test]
    fn filename_without_version_keeps_stem() {
        let (name, version) = name_and_version_from_filename("tools.jar");
        assert_eq!(name, "tools");
        assert_eq!(version, None);
    }

    #[test]
    fn hyphenated_name_without_digits_is_not_split() {
        let (name, version) = name_and_version_from_filename("foo-bar.zip");
        assert_eq!(name, "foo-bar");
        assert_eq!(version, None);
    }

    #[test]
    fn uppercase_extension_is_stripped() {
        let (name, version) = name_and_version_from_filename("LIB-2.0.JAR");
        assert_eq!(name, "LIB");
        assert_eq!(version.as_deref(), Some("2.0"));
    }

    #[test]
    fn last_version_like_segment_wins() {
        // rc-2 같은 중간 하이픈이 있어도 마지막 숫자 구간이 버전
        let (name, version) = name_and_version_from_filename("lib-4-util-1.0.0.jar");
        assert_eq!(name, "lib-4-util");
        assert_eq!(version.as_deref(), Some("1.0.0"));
    }
}
