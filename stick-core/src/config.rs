//! Debug stick configuration, read from `stick_config.json5`.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use serde::Deserialize;
use stick_utils::ResourceLocation;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/stick_config.json5");

/// The configuration of the running host, loaded on first use.
///
/// A broken file is logged and replaced by the defaults.
pub static STICK_CONFIG: LazyLock<StickConfig> = LazyLock::new(|| {
    StickConfig::load_or_create(Path::new("stick_config.json5")).unwrap_or_else(|err| {
        log::error!("Failed to load stick_config.json5, using defaults: {err}");
        StickConfig::default()
    })
});

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON5 for this config.
    #[error("config syntax: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of its allowed range.
    #[error("config value: {0}")]
    Invalid(&'static str),
}

/// Debug stick settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StickConfig {
    /// Item that opens the editor.
    pub item_id: String,
    /// Minimum ticks between two executions per interaction kind.
    pub throttle_ticks: u64,
    /// Reach of ray targeting, in blocks.
    pub max_distance: f64,
    /// Ray sampling step, in blocks.
    pub step_size: f64,
    /// The block type that counts as empty.
    pub empty_block: String,
    /// Prefix of the structures used for relocation.
    pub structure_prefix: String,
    /// Breaking with the stick targets the block above the broken one.
    pub break_targets_above: bool,
    /// Using the stick resolves its block with a raycast.
    pub item_use_raycast: bool,
    /// Ticks per second of the host loop.
    pub tick_rate: u32,
}

impl StickConfig {
    /// Reads the config at `path`, writing the bundled default there if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let config_str = fs::read_to_string(path)?;
            let config = Self::parse(&config_str)?;
            log::debug!("Loaded config from {}", path.display());
            return Ok(config);
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        log::info!("Wrote default config to {}", path.display());
        Ok(Self::default())
    }

    /// Parses and validates a config document.
    pub fn parse(config_str: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json5::from_str(config_str)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Checks the value ranges.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.item_id.trim().is_empty() {
            return Err("Item id must not be empty");
        }
        if self.throttle_ticks == 0 {
            return Err("Throttle ticks must be at least 1");
        }
        if !(self.max_distance.is_finite() && self.max_distance > 0.0) {
            return Err("Max distance must be a positive number");
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err("Step size must be a positive number");
        }
        if self.step_size > self.max_distance {
            return Err("Step size must not exceed max distance");
        }
        if self.empty_block.parse::<ResourceLocation>().is_err() {
            return Err("Empty block must be a valid block id");
        }
        if self.tick_rate == 0 {
            return Err("Tick rate must be at least 1");
        }
        Ok(())
    }

    /// The empty block type.
    #[must_use]
    pub fn empty_block(&self) -> ResourceLocation {
        self.empty_block
            .parse()
            .unwrap_or_else(|_| ResourceLocation::vanilla_static("air"))
    }
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            item_id: "ds:debug_stick".to_owned(),
            throttle_ticks: 5,
            max_distance: 8.0,
            step_size: 0.05,
            empty_block: "minecraft:air".to_owned(),
            structure_prefix: "ds:".to_owned(),
            break_targets_above: true,
            item_use_raycast: true,
            tick_rate: 20,
        }
    }
}
