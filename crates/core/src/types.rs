//! 정준(canonical) SBOM 모델 — 형식 중립 데이터 구조
//!
//! 모든 출력 형식은 이 모듈의 [`Sbom`] 하나를 중심으로 디코딩/인코딩됩니다.
//! 형식별 타입(CycloneDX 컴포넌트, SPDX 패키지 등)은 이 모델로 새어
//! 들어오지 않습니다.
//!
//! # 불변식
//!
//! - [`Package`]는 카탈로그에 방출된 이후 불변입니다.
//! - 패키지 identity는 name+version+type+location에서 유도되며 DB 키가 아닙니다.
//! - [`Relationship`]은 함께 방출된 패키지 id만 참조해야 합니다
//!   ([`Sbom::finalize`]가 이를 강제합니다).

use std::fmt;

use serde::{Deserialize, Serialize};

/// 패키지 생태계/유형
///
/// 발견된 패키지가 속한 패키지 관리 체계를 나타냅니다.
/// 아카이브 카탈로거는 주로 `Java`와 `Archive`를 방출합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    /// Java 아카이브 (jar, war, ear)
    Java,
    /// Rust (Cargo)
    Cargo,
    /// JavaScript/TypeScript (npm)
    Npm,
    /// Python (pypi)
    Python,
    /// 생태계 불명의 일반 아카이브
    Archive,
    /// 판별 불가
    Unknown,
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Java => write!(f, "java"),
            Self::Cargo => write!(f, "cargo"),
            Self::Npm => write!(f, "npm"),
            Self::Python => write!(f, "python"),
            Self::Archive => write!(f, "archive"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl PackageType {
    /// 생태계에 대응하는 Package URL 타입 접두사를 반환합니다.
    pub fn purl_type(&self) -> &'static str {
        match self {
            Self::Java => "maven",
            Self::Cargo => "cargo",
            Self::Npm => "npm",
            Self::Python => "pypi",
            Self::Archive | Self::Unknown => "generic",
        }
    }

    /// 문자열에서 패키지 유형을 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "java" | "maven" | "jar" => Some(Self::Java),
            "cargo" | "rust" | "crate" | "crates" => Some(Self::Cargo),
            "npm" | "node" | "javascript" | "js" => Some(Self::Npm),
            "python" | "pypi" | "pip" => Some(Self::Python),
            "archive" | "generic" => Some(Self::Archive),
            _ => None,
        }
    }
}

/// 논리적 파일 위치
///
/// 패키지가 발견된 위치를 나타냅니다. `real_path`가 실제 디스크 경로라는
/// 가정은 하지 않습니다 (이미지 레이어 등 가상 리졸버 대응).
/// `virtual_path`는 중첩 아카이브 내부 경로처럼 컨테이너 기준의
/// 상대 위치를 담습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// 리졸버 기준 경로
    pub real_path: String,
    /// 컨테이너 내부 경로 (중첩 아카이브의 경우)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_path: Option<String>,
}

impl Location {
    /// 실제 경로만으로 위치를 생성합니다.
    pub fn new(real_path: impl Into<String>) -> Self {
        Self {
            real_path: real_path.into(),
            virtual_path: None,
        }
    }

    /// 컨테이너 내부 경로를 포함한 위치를 생성합니다.
    pub fn with_virtual(real_path: impl Into<String>, virtual_path: impl Into<String>) -> Self {
        Self {
            real_path: real_path.into(),
            virtual_path: Some(virtual_path.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.virtual_path {
            Some(v) => write!(f, "{}:{}", self.real_path, v),
            None => write!(f, "{}", self.real_path),
        }
    }
}

/// 패키지 부가 메타데이터
///
/// 카탈로거별 다형 페이로드입니다. serde 태그로 직렬화되어
/// 네이티브 형식에서 무손실 왕복이 가능합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PackageMetadata {
    /// 메타데이터 없음
    #[default]
    None,
    /// Java META-INF/MANIFEST.MF에서 추출한 필드
    JavaManifest {
        /// Implementation-Title
        #[serde(skip_serializing_if = "Option::is_none")]
        implementation_title: Option<String>,
        /// Implementation-Version
        #[serde(skip_serializing_if = "Option::is_none")]
        implementation_version: Option<String>,
        /// Implementation-Vendor
        #[serde(skip_serializing_if = "Option::is_none")]
        implementation_vendor: Option<String>,
    },
}

/// 소프트웨어 패키지 정보
///
/// 카탈로거가 방출하는 단일 패키지입니다. 방출 이후 불변으로 취급됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// identity에서 유도된 고유 id (16자리 hex)
    pub id: String,
    /// 패키지 이름
    pub name: String,
    /// 패키지 버전
    pub version: String,
    /// 패키지 유형
    pub package_type: PackageType,
    /// 발견 위치 목록
    pub locations: Vec<Location>,
    /// 카탈로거별 부가 메타데이터
    #[serde(default)]
    pub metadata: PackageMetadata,
}

impl Package {
    /// 패키지를 생성하고 identity 기반 id를 유도합니다.
    ///
    /// id는 name+version+type+locations의 FNV-1a 64 해시입니다.
    /// 같은 필드를 가진 패키지는 언제나 같은 id를 가집니다.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        package_type: PackageType,
        locations: Vec<Location>,
        metadata: PackageMetadata,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        let id = derive_package_id(&name, &version, package_type, &locations);
        Self {
            id,
            name,
            version,
            package_type,
            locations,
            metadata,
        }
    }

    /// 패키지의 Package URL을 생성합니다.
    pub fn purl(&self) -> String {
        format!(
            "pkg:{}/{}@{}",
            self.package_type.purl_type(),
            self.name,
            self.version,
        )
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.package_type)
    }
}

/// identity 필드에서 패키지 id를 유도합니다.
fn derive_package_id(
    name: &str,
    version: &str,
    package_type: PackageType,
    locations: &[Location],
) -> String {
    let mut h = fnv1a64_init();
    for part in [name, "@", version, "@"] {
        for &b in part.as_bytes() {
            h = fnv1a64_update(h, b);
        }
    }
    for &b in package_type.to_string().as_bytes() {
        h = fnv1a64_update(h, b);
    }
    for loc in locations {
        h = fnv1a64_update(h, b'@');
        for &b in loc.to_string().as_bytes() {
            h = fnv1a64_update(h, b);
        }
    }
    format!("{h:016x}")
}

#[inline]
fn fnv1a64_init() -> u64 {
    14695981039346656037u64
}

#[inline]
fn fnv1a64_update(mut h: u64, b: u8) -> u64 {
    h ^= b as u64;
    h.wrapping_mul(1099511628211u64)
}

/// 패키지/아티팩트 간 관계 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    /// `from`이 `to`(아카이브 등) 내부에서 발견됨
    ContainedBy,
    /// `from`이 `to`의 의존성임
    DependencyOf,
    /// `from`(문서 소스)이 `to`를 기술함
    DescribedBy,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainedBy => write!(f, "contained-by"),
            Self::DependencyOf => write!(f, "dependency-of"),
            Self::DescribedBy => write!(f, "described-by"),
        }
    }
}

/// 패키지/아티팩트 간 관계
///
/// `from`/`to`는 함께 방출된 [`Package::id`]여야 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// 출발 패키지 id
    pub from: String,
    /// 대상 패키지 id
    pub to: String,
    /// 관계 종류
    pub kind: RelationshipKind,
}

/// 스캔 대상의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceScheme {
    /// 디렉토리 스캔
    Directory,
    /// 단일 파일/아카이브 스캔
    File,
}

impl fmt::Display for SourceScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::File => write!(f, "file"),
        }
    }
}

/// 스캔 대상 기술자
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// 대상 종류
    pub scheme: SourceScheme,
    /// 대상 경로/식별자
    pub target: String,
}

/// 문서를 생성한 도구 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// 도구 이름
    pub name: String,
    /// 도구 버전
    pub version: String,
}

impl Default for ToolDescriptor {
    fn default() -> Self {
        Self {
            name: "packhorse".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

/// 정준 SBOM 문서
///
/// 한 번의 카탈로깅 실행 동안 패키지/관계를 누적한 뒤,
/// [`finalize`](Self::finalize)를 거쳐 인코딩의 불변 입력이 됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sbom {
    /// 패키지 집합 (id 기준 중복 제거)
    pub packages: Vec<Package>,
    /// 관계 집합
    pub relationships: Vec<Relationship>,
    /// 스캔 대상
    pub source: SourceDescriptor,
    /// 생성 도구
    pub descriptor: ToolDescriptor,
}

impl Sbom {
    /// 주어진 소스에 대한 빈 SBOM을 생성합니다.
    pub fn new(source: SourceDescriptor) -> Self {
        Self {
            packages: Vec::new(),
            relationships: Vec::new(),
            source,
            descriptor: ToolDescriptor::default(),
        }
    }

    /// 패키지를 추가합니다. 같은 id가 이미 있으면 무시합니다.
    pub fn add_package(&mut self, package: Package) {
        if !self.packages.iter().any(|p| p.id == package.id) {
            self.packages.push(package);
        }
    }

    /// 관계를 추가합니다. 동일한 관계가 이미 있으면 무시합니다.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        if !self.relationships.contains(&relationship) {
            self.relationships.push(relationship);
        }
    }

    /// 패키지 수를 반환합니다.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// id로 패키지를 검색합니다.
    pub fn find_package(&self, id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// 인코딩 전 단일 스레드 결정화 패스.
    ///
    /// 동시 카탈로거의 방출 순서는 정확성에 영향이 없으므로, 여기서
    /// 패키지는 (name, version, id), 관계는 (from, to, kind) 순으로
    /// 정렬하여 출력 결정성을 확보합니다. 방출되지 않은 패키지 id를
    /// 참조하는 관계는 제거됩니다.
    pub fn finalize(&mut self) {
        self.packages
            .sort_by(|a, b| (&a.name, &a.version, &a.id).cmp(&(&b.name, &b.version, &b.id)));

        let known: std::collections::HashSet<&str> =
            self.packages.iter().map(|p| p.id.as_str()).collect();
        self.relationships.retain(|r| {
            let ok = known.contains(r.from.as_str()) && known.contains(r.to.as_str());
            if !ok {
                tracing::warn!(
                    from = %r.from,
                    to = %r.to,
                    kind = %r.kind,
                    "dropping relationship referencing unknown package id"
                );
            }
            ok
        });
        self.relationships
            .sort_by(|a, b| (&a.from, &a.to, a.kind).cmp(&(&b.from, &b.to, b.kind)));
    }
}

impl fmt::Display for Sbom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sbom({} {}, {} packages, {} relationships)",
            self.source.scheme,
            self.source.target,
            self.packages.len(),
            self.relationships.len(),
        )
    }
}
