//! Configuration file handling for ~/.tilemosaic/config.ini.
//!
//! Every setting is optional. Values present in the file override the
//! built-in defaults of a [`MosaicRequest`]; command-line flags override both.
//!
//! ```ini
//! [source]
//! template = https://tiles.example.com/{style}/{z}/{x}/{y}.png
//! style = satellite
//!
//! [download]
//! concurrency = 10
//! timeout_secs = 1200
//! fail_on_tile_error = false
//!
//! [render]
//! tile_size = 256
//! retina = true
//! min_width = 500
//! min_height = 500
//! background = #00000000
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::MosaicRequest;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[source]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSettings {
    pub template: Option<String>,
    /// Substituted for `{style}` in the template.
    pub style: Option<String>,
}

/// `[download]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSettings {
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub fail_on_tile_error: Option<bool>,
}

/// `[render]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSettings {
    pub tile_size: Option<u32>,
    pub retina: Option<bool>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub background: Option<[u8; 4]>,
}

/// User configuration loaded from an INI file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub source: SourceSettings,
    pub download: DownloadSettings,
    pub render: RenderSettings,
}

impl ConfigFile {
    /// Loads from the default path (~/.tilemosaic/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Loads from `path`. A missing file yields an empty configuration.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Overlays the values present in this file onto `request`.
    pub fn apply(&self, mut request: MosaicRequest) -> MosaicRequest {
        if let Some(v) = self.download.concurrency {
            request.concurrency = v;
        }
        if let Some(v) = self.download.timeout_secs {
            request.tile_timeout = Duration::from_secs(v);
        }
        if let Some(v) = self.download.fail_on_tile_error {
            request.fail_on_tile_error = v;
        }
        if let Some(v) = self.render.tile_size {
            request.tile_size = v;
        }
        if let Some(v) = self.render.retina {
            request.retina = v;
        }
        if let Some(v) = self.render.min_width {
            request.min_width = v;
        }
        if let Some(v) = self.render.min_height {
            request.min_height = v;
        }
        if let Some(v) = self.render.background {
            request.background = v;
        }
        request
    }
}

impl FromStr for ConfigFile {
    type Err = ConfigFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ini = Ini::load_from_str(s)
            .map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        parse_ini(&ini)
    }
}

/// Path to the config directory (~/.tilemosaic).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilemosaic")
}

/// Path to the config file (~/.tilemosaic/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        config.source.template = non_empty(section.get("template"));
        config.source.style = non_empty(section.get("style"));
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("concurrency") {
            let n: usize = parse_number("download", "concurrency", v)?;
            if n == 0 {
                return Err(invalid("download", "concurrency", v, "must be at least 1"));
            }
            config.download.concurrency = Some(n);
        }
        if let Some(v) = section.get("timeout_secs") {
            let secs: u64 = parse_number("download", "timeout_secs", v)?;
            if secs == 0 {
                return Err(invalid("download", "timeout_secs", v, "must be positive"));
            }
            config.download.timeout_secs = Some(secs);
        }
        if let Some(v) = section.get("fail_on_tile_error") {
            config.download.fail_on_tile_error =
                Some(parse_flag("download", "fail_on_tile_error", v)?);
        }
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("tile_size") {
            let size: u32 = parse_number("render", "tile_size", v)?;
            if size == 0 {
                return Err(invalid("render", "tile_size", v, "must be positive"));
            }
            config.render.tile_size = Some(size);
        }
        if let Some(v) = section.get("retina") {
            config.render.retina = Some(parse_flag("render", "retina", v)?);
        }
        if let Some(v) = section.get("min_width") {
            config.render.min_width = Some(parse_number("render", "min_width", v)?);
        }
        if let Some(v) = section.get("min_height") {
            config.render.min_height = Some(parse_number("render", "min_height", v)?);
        }
        if let Some(v) = section.get("background") {
            config.render.background = Some(parse_color(v).ok_or_else(|| {
                invalid(
                    "render",
                    "background",
                    v,
                    "expected 'transparent', '#rrggbb' or '#rrggbbaa'",
                )
            })?);
        }
    }

    Ok(config)
}

/// Parses `transparent`, `#rrggbb` or `#rrggbbaa` into RGBA.
pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("transparent") {
        return Some([0, 0, 0, 0]);
    }

    let hex = v.strip_prefix('#')?;
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    Some([
        channel(0)?,
        channel(2)?,
        channel(4)?,
        if hex.len() == 8 { channel(6)? } else { 255 },
    ])
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

/// Accepts true/false, yes/no, 1/0, on/off (case-insensitive).
fn parse_flag(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
