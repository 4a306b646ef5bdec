//! Read client configuration from a file.
//!
//! Every field has a default, so an empty file (or none at all) gives the
//! behaviour of the stock local bitmap browser.

use decode::{MAX_IMAGE_SIZE, MIN_IMAGE_SIZE};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;
use toml;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub local_bitmaps: LocalBitmapsConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LocalBitmapsConfig {
    /// Seconds between two update passes over all watched files.
    pub heartbeat_secs: f32,

    /// How many failed decodes a unit survives before its link breaks.
    pub update_retries: u32,

    /// Upper bound for both texture dimensions after the power of two resize,
    /// between `MIN_IMAGE_SIZE` and `MAX_IMAGE_SIZE`.
    pub max_image_size: u32,

    /// Point everything still using a removed unit back at the default texture.
    pub replace_on_delete: bool,

    /// Passed on to the avatar when a full rebake is forced.
    pub slam_rebake: bool,
}

impl Default for LocalBitmapsConfig {
    fn default() -> Self {
        LocalBitmapsConfig {
            heartbeat_secs: 3.0,
            update_retries: 5,
            max_image_size: 1024,
            replace_on_delete: true,
            slam_rebake: true,
        }
    }
}

impl LocalBitmapsConfig {
    pub fn heartbeat(&self) -> Duration {
        let millis = (self.heartbeat_secs.max(0.0) * 1000.) as u64;
        Duration::from_millis(millis.max(1))
    }
}

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "Failed reading config file {}: {}", path, error)]
    Read {
        path: String,
        #[cause]
        error: io::Error,
    },

    #[fail(display = "Invalid TOML: {}", _0)]
    Parse(#[cause] toml::de::Error),

    #[fail(display = "Invalid config value: {}", _0)]
    Invalid(String),
}

pub fn get_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let read_error = |error| ConfigError::Read {
        path: path.as_ref().display().to_string(),
        error,
    };
    let mut file = File::open(path.as_ref()).map_err(&read_error)?;
    let mut raw_data = String::new();
    file.read_to_string(&mut raw_data).map_err(&read_error)?;
    parse_config(raw_data.as_str())
}

pub fn parse_config(raw_data: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw_data).map_err(ConfigError::Parse)?;
    let max_size = config.local_bitmaps.max_image_size;
    if max_size < MIN_IMAGE_SIZE || max_size > MAX_IMAGE_SIZE {
        return Err(ConfigError::Invalid(format!(
            "max_image_size must be between {} and {}, got {}",
            MIN_IMAGE_SIZE, MAX_IMAGE_SIZE, max_size
        )));
    }
    Ok(config)
}
