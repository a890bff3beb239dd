//! The config types this binary manages.
//!
//! | Type            | File                | Phase    | Registered by  |
//! |-----------------|---------------------|----------|----------------|
//! | `DisplayConfig` | `display.cfg`       | early    | [`install`]    |
//! | `AudioConfig`   | `AudioConfig.cfg`   | standard | [`install`]    |
//! | `NetworkConfig` | `NetworkConfig.cfg` | standard | discovery only |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use fieldcfg_core::{ConfigError, ConfigMeta, ConfigRegistry, ConfigType, FieldMap, TextConverter};

/// Type key written for [`Quality`] fields.
pub const QUALITY_KEY: &str = "quality";

/// Window geometry; loaded before anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fullscreen: false,
        }
    }
}

impl ConfigType for DisplayConfig {
    fn metadata() -> Option<ConfigMeta> {
        Some(ConfigMeta::new().early().file_name("display.cfg"))
    }

    fn fields() -> FieldMap<Self> {
        FieldMap::<Self>::new()
            .field("width", |c| &c.width, |c| &mut c.width)
            .category("Display")
            .comment("Window width in pixels")
            .field("height", |c| &c.height, |c| &mut c.height)
            .category("Display")
            .comment("Window height in pixels")
            .field("fullscreen", |c| &c.fullscreen, |c| &mut c.fullscreen)
            .category("Display")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioConfig {
    pub volume: i32,
    pub muted: bool,
    pub device: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 100,
            muted: false,
            device: "default".to_string(),
        }
    }
}

impl ConfigType for AudioConfig {
    fn metadata() -> Option<ConfigMeta> {
        Some(ConfigMeta::new())
    }

    fn fields() -> FieldMap<Self> {
        FieldMap::<Self>::new()
            .field("volume", |c| &c.volume, |c| &mut c.volume)
            .category("Audio")
            .comment("Sound volume")
            .field("muted", |c| &c.muted, |c| &mut c.muted)
            .category("Audio")
            .field("device", |c| &c.device, |c| &mut c.device)
            .category("Audio")
            .comment("Output device name")
    }
}

/// Stream quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    Low,
    #[default]
    Balanced,
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quality::Low => "low",
            Quality::Balanced => "balanced",
            Quality::High => "high",
        })
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "balanced" => Ok(Quality::Balanced),
            "high" => Ok(Quality::High),
            other => Err(format!("unknown quality '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    pub quality: Quality,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 24800,
            quality: Quality::default(),
        }
    }
}

impl ConfigType for NetworkConfig {
    fn metadata() -> Option<ConfigMeta> {
        Some(ConfigMeta::new())
    }

    fn fields() -> FieldMap<Self> {
        FieldMap::<Self>::new()
            .field("host", |c| &c.host, |c| &mut c.host)
            .category("Network")
            .field("port", |c| &c.port, |c| &mut c.port)
            .category("Network")
            .comment("Control port")
            .field("quality", |c| &c.quality, |c| &mut c.quality)
            .category("Stream")
            .comment("One of: low, balanced, high")
    }
}

/// Registers this binary's converters, discoverable types and always-on
/// configs with `registry`.
///
/// # Errors
///
/// Propagates registration failures.
pub fn install(registry: &mut ConfigRegistry) -> Result<(), ConfigError> {
    registry.register_converter(TextConverter::<Quality>::new(QUALITY_KEY));

    registry.register_type::<DisplayConfig>();
    registry.register_type::<AudioConfig>();
    registry.register_type::<NetworkConfig>();

    registry.register_config(Rc::new(RefCell::new(DisplayConfig::default())))?;
    registry.register_config(Rc::new(RefCell::new(AudioConfig::default())))?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Quality>(), Ok(Quality::High));
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn test_install_queues_display_early_and_audio_standard() {
        let mut registry = ConfigRegistry::new("unused");

        install(&mut registry).unwrap();

        assert_eq!(registry.pending_early(), 1);
        assert_eq!(registry.pending_standard(), 1);
        assert!(registry.instance::<NetworkConfig>().is_none());
    }
}
