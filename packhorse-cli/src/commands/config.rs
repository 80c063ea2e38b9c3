//! `packhorse config` command handler

use std::path::Path;

use packhorse_core::config::PackhorseConfig;

use crate::cli::ConfigAction;
use crate::error::CliError;

/// Execute the `config` command.
///
/// Unlike the other subcommands, `config` requires the file to exist:
/// validating or showing an absent file would silently report defaults.
pub async fn execute(action: ConfigAction, config_path: &Path) -> Result<(), CliError> {
    let config = PackhorseConfig::load(config_path)
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;

    match action {
        ConfigAction::Validate => {
            println!("configuration OK: {}", config_path.display());
        }
        ConfigAction::Show { section } => {
            let rendered = render_config(&config, section.as_deref())?;
            print!("{rendered}");
        }
    }
    Ok(())
}

fn render_config(config: &PackhorseConfig, section: Option<&str>) -> Result<String, CliError> {
    match section {
        None => render_toml(config),
        Some("general") => render_toml(&config.general),
        Some("archive") => render_toml(&config.archive),
        Some("output") => render_toml(&config.output),
        Some(other) => Err(CliError::Command(format!(
            "unknown config section '{other}' (expected: general, archive, output)"
        ))),
    }
}

fn render_toml<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    toml::to_string_pretty(value)
        .map_err(|e| CliError::Command(format!("failed to render config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_full_config_is_valid_toml() {
        let config = PackhorseConfig::default();
        let rendered = render_config(&config, None).unwrap();
        let parsed = PackhorseConfig::parse(&rendered).unwrap();
        assert_eq!(parsed.archive.max_depth, config.archive.max_depth);
    }

    #[test]
    fn render_single_section() {
        let config = PackhorseConfig::default();
        let rendered = render_config(&config, Some("archive")).unwrap();
        assert!(rendered.contains("max_depth"));
        assert!(!rendered.contains("log_level"));
    }

    #[test]
    fn render_unknown_section_is_rejected() {
        let config = PackhorseConfig::default();
        assert!(render_config(&config, Some("daemon")).is_err());
    }
}
