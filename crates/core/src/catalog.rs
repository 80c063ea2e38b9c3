//! 카탈로거 trait 및 동시 실행 러너
//!
//! [`Cataloger`]는 리졸버로 파일 내용을 읽어 패키지/관계 레코드를
//! 방출하는 확장 지점입니다. 아카이브 카탈로거와 생태계별 카탈로거가
//! 모두 이 trait으로 등록됩니다.
//!
//! [`run_catalogers`]는 카탈로거들을 워커 풀에서 동시에 실행합니다.
//! 공유 가변 상태는 최종 [`Sbom`] 누적 지점 하나뿐이며, 단일 뮤텍스로
//! 보호됩니다. 한 카탈로거의 실패는 기록 후 건너뛰고 전체 실행을
//! 중단하지 않습니다 (부분 결과가 SBOM 완전성에 더 가치 있음).

use std::sync::Arc;

use metrics::counter;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::PackhorseError;
use crate::metrics::{CATALOG_FAILURES_TOTAL, CATALOG_PACKAGES_TOTAL, LABEL_CATALOGER};
use crate::resolver::FileResolver;
use crate::types::{Package, Relationship, Sbom};

/// 카탈로거 trait
///
/// 구현체는 리졸버를 통해서만 파일에 접근해야 하며, 방출한 관계는
/// 함께 방출한 패키지 id만 참조해야 합니다.
pub trait Cataloger: Send + Sync {
    /// 카탈로거 이름 (로그/메트릭 레이블용)
    fn name(&self) -> &str;

    /// 리졸버가 제공하는 내용에서 패키지와 관계를 발견합니다.
    fn catalog(
        &self,
        resolver: &dyn FileResolver,
    ) -> Result<(Vec<Package>, Vec<Relationship>), PackhorseError>;
}

/// 등록된 카탈로거들을 동시에 실행하고 결과를 SBOM에 누적합니다.
///
/// - 워커 수는 가용 병렬도에 맞춰 제한됩니다.
/// - 카탈로깅 자체는 블로킹 동기 작업이므로 `spawn_blocking`으로 실행됩니다.
/// - `cancel` 신호가 오면 대기 중인 작업은 시작하지 않고, 진행 중인
///   작업의 결과는 버립니다. 추출 핸들 정리는 각 카탈로거의 Drop
///   계약이 보장합니다.
/// - 모든 워커가 끝난 뒤 [`Sbom::finalize`]로 출력 결정성을 확보합니다.
pub async fn run_catalogers(
    catalogers: Vec<Arc<dyn Cataloger>>,
    resolver: Arc<dyn FileResolver>,
    sbom: Sbom,
    cancel: CancellationToken,
) -> Result<Sbom, PackhorseError> {
    let parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let accumulator = Arc::new(Mutex::new(sbom));

    info!(
        catalogers = catalogers.len(),
        workers = parallelism,
        "starting catalog run"
    );

    let mut handles = Vec::with_capacity(catalogers.len());
    for cataloger in catalogers {
        let semaphore = Arc::clone(&semaphore);
        let accumulator = Arc::clone(&accumulator);
        let resolver = Arc::clone(&resolver);
        let cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let name = cataloger.name().to_owned();
            if cancel.is_cancelled() {
                debug!(cataloger = %name, "catalog run cancelled before start");
                return;
            }

            let task = tokio::task::spawn_blocking(move || cataloger.catalog(resolver.as_ref()));
            let result = tokio::select! {
                result = task => result,
                _ = cancel.cancelled() => {
                    debug!(cataloger = %name, "catalog task cancelled, discarding result");
                    return;
                }
            };

            match result {
                Ok(Ok((packages, relationships))) => {
                    debug!(
                        cataloger = %name,
                        packages = packages.len(),
                        relationships = relationships.len(),
                        "cataloger finished"
                    );
                    counter!(CATALOG_PACKAGES_TOTAL, LABEL_CATALOGER => name)
                        .increment(packages.len() as u64);
                    let mut sbom = accumulator.lock().await;
                    for package in packages {
                        sbom.add_package(package);
                    }
                    for relationship in relationships {
                        sbom.add_relationship(relationship);
                    }
                }
                Ok(Err(e)) => {
                    warn!(cataloger = %name, error = %e, "cataloger failed, skipping");
                    counter!(CATALOG_FAILURES_TOTAL, LABEL_CATALOGER => name)
                        .increment(1);
                }
                Err(e) => {
                    warn!(cataloger = %name, error = %e, "catalog task aborted");
                    counter!(CATALOG_FAILURES_TOTAL, LABEL_CATALOGER => name)
                        .increment(1);
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    let accumulator = Arc::try_unwrap(accumulator)
        .map_err(|_| PackhorseError::Catalog("sbom accumulator still shared".to_owned()))?;
    let mut sbom = accumulator.into_inner();
    sbom.finalize();

    info!(
        packages = sbom.package_count(),
        relationships = sbom.relationships.len(),
        cancelled = cancel.is_cancelled(),
        "catalog run finished"
    );

    Ok(sbom)
}
