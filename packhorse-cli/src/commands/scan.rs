//! `packhorse scan` command handler

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use packhorse_archive::{ArchiveCataloger, ArchiveConfig};
use packhorse_core::catalog::{Cataloger, run_catalogers};
use packhorse_core::config::PackhorseConfig;
use packhorse_core::resolver::{DirectoryResolver, FileResolver};
use packhorse_core::types::{Sbom, SourceDescriptor, SourceScheme};
use packhorse_format::{Format, FormatRegistry};

use crate::cli::ScanArgs;
use crate::error::CliError;

/// Execute the `scan` command.
pub async fn execute(args: ScanArgs, config: &PackhorseConfig) -> Result<(), CliError> {
    if !args.path.is_dir() {
        return Err(CliError::Command(format!(
            "scan path is not a directory: {}",
            args.path.display()
        )));
    }

    let mut archive_config = ArchiveConfig::from(&config.archive);
    if let Some(depth) = args.max_depth {
        archive_config.max_depth = depth;
    }
    archive_config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let registry = FormatRegistry::new();
    let format_name = args
        .output_format
        .as_deref()
        .unwrap_or(&config.output.format);
    let format = registry
        .by_name(format_name)
        .ok_or_else(|| CliError::Command(format!("unknown output format '{format_name}'")))?;

    info!(path = %args.path.display(), format = %format.id(), "starting scan");

    let resolver: Arc<dyn FileResolver> = Arc::new(DirectoryResolver::new(args.path.clone()));
    let catalogers: Vec<Arc<dyn Cataloger>> =
        vec![Arc::new(ArchiveCataloger::new(archive_config))];
    let sbom = Sbom::new(SourceDescriptor {
        scheme: SourceScheme::Directory,
        target: args.path.display().to_string(),
    });

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling scan");
            signal_cancel.cancel();
        }
    });

    let sbom = run_catalogers(catalogers, resolver, sbom, cancel).await?;

    write_document(format, &sbom, args.file.as_deref())?;

    info!(
        packages = sbom.package_count(),
        relationships = sbom.relationships.len(),
        "scan finished"
    );
    Ok(())
}

/// 문서를 파일 또는 stdout에 씁니다.
fn write_document(
    format: &dyn Format,
    sbom: &Sbom,
    file: Option<&Path>,
) -> Result<(), CliError> {
    match file {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            format.encode(sbom, &mut writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            format.encode(sbom, &mut handle)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
