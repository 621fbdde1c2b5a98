//! TOML configuration of the acquisition setup
//!
//! Every entry is optional and falls back to the setup defaults:
//! ```toml
//! [digitizer]
//! sample_rate_hz = 180e6
//! [legacy_laser]
//! aline_size = 8192
//! [swept_laser]
//! sweep_period_s = 8e-6
//! [background]
//! trace_width = 6144
//! frames = 10000
//! ```

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{sampling, AlineParameterCalculator};

/// Samples per trace of the background acquisition (2048x3)
pub const TRACE_WIDTH: usize = 6144;
/// Number of traces averaged into the background
pub const BACKGROUND_FRAMES: usize = 10000;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read the configuration file")]
    Io(#[from] std::io::Error),
    #[error("Failed to deserialize the TOML configuration")]
    Toml(#[from] toml::de::Error),
}
type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Digitizer {
    pub sample_rate_hz: f64,
}
impl Default for Digitizer {
    fn default() -> Self {
        Self {
            sample_rate_hz: sampling::SAMPLE_RATE_HZ,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LegacyLaser {
    pub aline_size: u64,
}
impl Default for LegacyLaser {
    fn default() -> Self {
        Self {
            aline_size: sampling::LEGACY_ALINE_SIZE,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SweptLaser {
    pub sweep_period_s: f64,
}
impl Default for SweptLaser {
    fn default() -> Self {
        Self {
            sweep_period_s: sampling::SWEEP_PERIOD_S,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    pub trace_width: usize,
    pub frames: usize,
}
impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            trace_width: TRACE_WIDTH,
            frames: BACKGROUND_FRAMES,
        }
    }
}

/// Acquisition setup
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DaqConfig {
    pub digitizer: Digitizer,
    pub legacy_laser: LegacyLaser,
    pub swept_laser: SweptLaser,
    pub background: BackgroundConfig,
}
impl DaqConfig {
    /// Loads the configuration from a TOML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading {:?}...", path);
        let contents = fs::read_to_string(path)?;
        contents.parse()
    }
    /// Returns the configuration in `path` or the defaults if there is none
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }
    /// Aline calculator set to this configuration
    pub fn calculator(&self) -> AlineParameterCalculator {
        AlineParameterCalculator::default()
            .sample_rate(self.digitizer.sample_rate_hz)
            .legacy_aline_size(self.legacy_laser.aline_size)
            .sweep_period(self.swept_laser.sweep_period_s)
    }
}
impl std::str::FromStr for DaqConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
