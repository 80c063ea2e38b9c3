//! packhorse CLI entry point

mod cli;
mod commands;
mod error;
mod logging;

use std::path::Path;

use clap::Parser;

use packhorse_core::config::PackhorseConfig;
use packhorse_core::error::{ConfigError, PackhorseError};

use crate::cli::{Cli, Commands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = load_config(&cli.config).await?;
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    logging::init_tracing(&config.general).map_err(|e| CliError::Config(e.to_string()))?;
    packhorse_core::metrics::describe_all();

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &config).await,
        Commands::Convert(args) => commands::convert::execute(args, &config).await,
        Commands::Formats => commands::formats::execute(),
        Commands::Config(args) => commands::config::execute(args.action, &cli.config).await,
    }
}

/// 설정 파일을 로드합니다. 파일이 없으면 기본값에 환경변수 오버라이드만
/// 적용해 계속 진행합니다 (명시적 `config` 명령은 파일을 요구함).
async fn load_config(path: &Path) -> Result<PackhorseConfig, CliError> {
    match PackhorseConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(PackhorseError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = PackhorseConfig::default();
            config.apply_env_overrides();
            Ok(config)
        }
        Err(e) => Err(CliError::Config(e.to_string())),
    }
}
