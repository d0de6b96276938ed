//! `reforge config`: inspect the effective configuration.

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(cmd: ConfigCommands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cmd {
        ConfigCommands::Show => {
            if output.is_json() {
                output.json(&config)?;
            } else {
                output.print(&render_toml(&config)?)?;
            }
        }

        ConfigCommands::Path => {
            output.print(&AppConfig::config_path().display().to_string())?;
        }
    }

    Ok(())
}

fn render_toml(config: &AppConfig) -> CliResult<String> {
    toml::to_string_pretty(config).map_err(|e| CliError::config("failed to serialise config", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_every_section() {
        let rendered = render_toml(&AppConfig::default()).unwrap();
        for section in ["[catalog]", "[discovery]", "[regeneration]", "[output]"] {
            assert!(rendered.contains(section), "missing {section} in\n{rendered}");
        }
        assert!(rendered.contains("environment = \"production\""));
    }

    #[test]
    fn rendered_config_loads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reforge.toml");
        std::fs::write(&path, render_toml(&AppConfig::default()).unwrap()).unwrap();

        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.regeneration, AppConfig::default().regeneration);
    }
}
