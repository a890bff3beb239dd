//! fieldcfg: loads, repairs and edits this application's config files.
//!
//! Running the binary performs a full bootstrap: every registered config is
//! read from its file (or created from defaults), stale entries are dropped,
//! missing entries are added, and the file is rewritten.  `--set` then edits
//! individual fields through the registry, which persists each change
//! immediately.  The paths of all loaded config files are printed on exit.
//!
//! # Usage
//!
//! ```text
//! fieldcfg [OPTIONS]
//!
//! Options:
//!   --settings   <PATH>                  Engine settings file [default: fieldcfg.toml]
//!   --config-dir <DIR>                   Overrides `config_dir` from the settings file
//!   --set        <CATEGORY.FIELD=VALUE>  Assigns a field after loading (repeatable)
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable              | Default          | Description                 |
//! |-----------------------|------------------|-----------------------------|
//! | `FIELDCFG_SETTINGS`   | `fieldcfg.toml`  | Engine settings file        |
//! | `FIELDCFG_CONFIG_DIR` | from settings    | Config file directory       |
//! | `RUST_LOG`            | from settings    | Log filter                  |

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fieldcfg_cli::app;
use fieldcfg_cli::assign::{self, Assignment};
use fieldcfg_core::{ConfigRegistry, RegistrySettings};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Loads and rewrites config files, optionally editing fields.
#[derive(Debug, Parser)]
#[command(
    name = "fieldcfg",
    about = "Loads, repairs and edits categorized config files",
    version
)]
struct Cli {
    /// Engine settings file (TOML).  A missing file means default settings.
    #[arg(long, default_value = "fieldcfg.toml", env = "FIELDCFG_SETTINGS")]
    settings: PathBuf,

    /// Directory holding the config files; overrides the settings file.
    #[arg(long, env = "FIELDCFG_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Field assignment applied after loading, as `Category.field=value`.
    #[arg(long = "set", value_name = "CATEGORY.FIELD=VALUE")]
    assignments: Vec<Assignment>,
}

impl Cli {
    /// Loads the settings file and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be read or
    /// parsed.
    fn resolve_settings(&self) -> anyhow::Result<RegistrySettings> {
        let mut settings = RegistrySettings::load(&self.settings)
            .with_context(|| format!("failed to load settings from {}", self.settings.display()))?;
        if let Some(dir) = &self.config_dir {
            settings.config_dir = dir.clone();
        }
        Ok(settings)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.resolve_settings()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the settings file's `log_level` applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    info!(
        config_dir = %settings.config_dir.display(),
        discover = settings.discover.len(),
        "fieldcfg starting"
    );

    // ── Bootstrap ─────────────────────────────────────────────────────────────
    let mut registry = ConfigRegistry::from_settings(&settings);
    app::install(&mut registry).context("failed to register configs")?;
    registry.run_early_phase();
    registry.run_standard_phase();

    // ── Edits ─────────────────────────────────────────────────────────────────
    for assignment in &cli.assignments {
        assign::apply(&mut registry, assignment).with_context(|| {
            format!(
                "cannot set {}.{}",
                assignment.category, assignment.field
            )
        })?;
        info!(
            category = %assignment.category,
            field = %assignment.field,
            value = %assignment.text,
            "field updated"
        );
    }

    for path in registry.loaded_files() {
        println!("{}", path.display());
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_cli_defaults() {
        // Arrange / Act
        let cli = Cli::parse_from(["fieldcfg"]);

        // Assert
        assert_eq!(cli.settings, PathBuf::from("fieldcfg.toml"));
        assert!(cli.assignments.is_empty());
    }

    #[test]
    fn test_cli_collects_repeated_set_flags() {
        let cli = Cli::parse_from([
            "fieldcfg",
            "--set",
            "Audio.volume=10",
            "--set",
            "Audio.muted=true",
        ]);

        assert_eq!(cli.assignments.len(), 2);
        assert_eq!(cli.assignments[1].field, "muted");
    }

    #[test]
    fn test_cli_rejects_malformed_set_flag() {
        let result = Cli::try_parse_from(["fieldcfg", "--set", "volume"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_dir_flag_overrides_settings() {
        // Arrange
        let settings_path =
            std::env::temp_dir().join(format!("fieldcfg_main_{}.toml", Uuid::new_v4()));
        std::fs::write(&settings_path, "config_dir = \"/from/settings\"\n").unwrap();
        let cli = Cli::parse_from([
            "fieldcfg",
            "--settings",
            settings_path.to_str().unwrap(),
            "--config-dir",
            "/from/flag",
        ]);

        // Act
        let settings = cli.resolve_settings().unwrap();

        // Assert
        assert_eq!(settings.config_dir, PathBuf::from("/from/flag"));

        std::fs::remove_file(&settings_path).ok();
    }
}
