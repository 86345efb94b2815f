//! Loads the game configuration and applies command-line overrides.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use wegen_arcade_core::GameConfig;

/// Spawn stream seeds are derived from the session seed with this mask.
const SPAWN_SEED_MASK: u64 = 0x9e37_79b9_7f4a_7c15;

/// Command-line values that take precedence over the configuration file.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Overrides {
    pub(crate) seed: Option<u64>,
    pub(crate) time_bank_secs: Option<u32>,
    pub(crate) near_miss_radius: Option<f32>,
}

/// Reads the optional TOML file, applies overrides, and validates the result.
pub(crate) fn load(path: Option<&Path>, overrides: Overrides) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            parse(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    apply(&mut config, overrides);
    config.validate().context("configuration rejected")?;
    Ok(config)
}

fn parse(text: &str) -> Result<GameConfig> {
    Ok(toml::from_str(text)?)
}

fn apply(config: &mut GameConfig, overrides: Overrides) {
    if let Some(seed) = overrides.seed {
        config.session.seed = seed;
        config.spawn.seed = seed ^ SPAWN_SEED_MASK;
    }
    if let Some(time_bank_secs) = overrides.time_bank_secs {
        config.session.time_bank_secs = time_bank_secs;
    }
    if let Some(radius) = overrides.near_miss_radius {
        config.session.near_miss_radius = radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let config = load(None, Overrides::default()).expect("defaults are valid");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn file_values_yield_to_flags() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[session]\ntime_bank_secs = 45\ncolumns = 4\n\n[spawn]\nbase_interval_ms = 800"
        )
        .expect("write config");

        let overrides = Overrides {
            seed: Some(99),
            time_bank_secs: Some(20),
            near_miss_radius: None,
        };
        let config = load(Some(file.path()), overrides).expect("valid config");

        assert_eq!(config.session.time_bank_secs, 20);
        assert_eq!(config.session.columns, 4);
        assert_eq!(config.session.rows, 3);
        assert_eq!(config.spawn.base_interval_ms, 800);
        assert_eq!(config.session.seed, 99);
        assert_eq!(config.spawn.seed, 99 ^ SPAWN_SEED_MASK);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let overrides = Overrides {
            time_bank_secs: Some(0),
            ..Overrides::default()
        };
        let error = load(None, overrides).expect_err("empty bank rejected");
        assert!(format!("{error:#}").contains("time bank"));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load(Some(Path::new("/nonexistent/wegen.toml")), Overrides::default())
            .expect_err("missing file");
        assert!(format!("{error:#}").contains("/nonexistent/wegen.toml"));
    }
}
