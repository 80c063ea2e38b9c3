//! `packhorse convert` command handler

use std::io::Write;

use tracing::info;

use packhorse_core::config::PackhorseConfig;
use packhorse_format::{Format, FormatRegistry, convert};

use crate::cli::ConvertArgs;
use crate::error::CliError;

/// Execute the `convert` command.
pub async fn execute(args: ConvertArgs, _config: &PackhorseConfig) -> Result<(), CliError> {
    let input = tokio::fs::read(&args.input).await?;

    let registry = FormatRegistry::new();
    let source: &dyn Format = match &args.from {
        Some(name) => registry
            .by_name(name)
            .ok_or_else(|| CliError::Command(format!("unknown source format '{name}'")))?,
        None => registry.identify(&input).ok_or_else(|| {
            CliError::Command(format!(
                "could not identify the format of {}; pass --from",
                args.input.display()
            ))
        })?,
    };

    info!(
        input = %args.input.display(),
        source = %source.id(),
        target = %args.to,
        "converting document"
    );

    let mut output = Vec::new();
    convert(&registry, source, &input, &args.to, &mut output)?;

    match &args.file {
        Some(path) => tokio::fs::write(path, &output).await?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(&output)?;
            if !output.ends_with(b"\n") {
                writeln!(handle)?;
            }
        }
    }
    Ok(())
}
