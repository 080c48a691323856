//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("url") {
            config.server.url = parse_url("server", "url", v)?;
        }
        if let Some(v) = section.get("email") {
            config.server.email = v.trim().to_string();
        }
        if let Some(v) = section.get("password") {
            config.server.password = v.to_string();
        }
        if let Some(v) = section.get("timeout") {
            config.server.timeout =
                parse_positive("server", "timeout", v, "must be a positive integer (seconds)")?;
        }
    }

    // [geocoder] section
    if let Some(section) = ini.section(Some("geocoder")) {
        if let Some(v) = section.get("url") {
            config.geocoder.url = parse_url("geocoder", "url", v)?;
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.geocoder.user_agent = v.to_string();
            }
        }
        if let Some(v) = section.get("zoom") {
            config.geocoder.zoom = match v.trim().parse::<u8>() {
                Ok(zoom) if zoom <= 18 => zoom,
                _ => {
                    return Err(invalid("geocoder", "zoom", v, "must be an integer from 0 to 18"));
                }
            };
        }
    }

    // [polling] section
    if let Some(section) = ini.section(Some("polling")) {
        if let Some(v) = section.get("interval") {
            config.polling.interval =
                parse_positive("polling", "interval", v, "must be a positive integer (seconds)")?;
        }
        if let Some(v) = section.get("online_threshold") {
            config.polling.online_threshold = parse_positive(
                "polling",
                "online_threshold",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
    }

    // [trail] section
    if let Some(section) = ini.section(Some("trail")) {
        if let Some(v) = section.get("max_points") {
            config.trail.max_points =
                parse_positive("trail", "max_points", v, "must be a positive integer")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse an integer that must be at least 1.
fn parse_positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + From<u8>,
{
    match value.trim().parse::<T>() {
        Ok(n) if n >= T::from(1) => Ok(n),
        _ => Err(invalid(section, key, value, reason)),
    }
}

/// Accept only http(s) URLs, without trailing slash.
fn parse_url(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    let v = value.trim();
    if !(v.starts_with("http://") || v.starts_with("https://")) {
        return Err(invalid(section, key, value, "must start with http:// or https://"));
    }
    Ok(v.trim_end_matches('/').to_string())
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
