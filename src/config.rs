//! Runtime settings
//!
//! Settings come from string key/value pairs. The firmware has no process
//! environment, so [`baked`] serves the values captured from the build
//! environment by `option_env!`; tests pass their own lookup.

use anyhow::{bail, Context, Result};

/// Screen sizes the Pixoo family ships with
pub const SUPPORTED_SCREEN_SIZES: [u32; 3] = [16, 32, 64];

const DEFAULT_SCREEN_SIZE: u32 = 64;
const DEFAULT_RETRY_DELAY_SECS: u32 = 5;
const DEFAULT_SCREEN_TIME_SECS: f32 = 10.0;
const DEFAULT_LABEL: &str = "Nightscout";
const MS_PER_SECOND: f32 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Pixoo address, `host` or `host:port`
    pub pixoo_host: String,
    pub screen_size: u32,
    pub retry_delay_secs: u32,
    /// Applied once after connecting, 0-100
    pub brightness: Option<u8>,
    pub nightscout_url: String,
    /// Dwell time per channel
    pub screen_time_ms: u32,
    pub label: String,
    pub utc_offset_minutes: i32,
    pub wifi_ssid: Option<String>,
    pub wifi_password: Option<String>,
}

impl Config {
    /// Build settings from `lookup`, which returns `None` for unset keys
    pub fn from_lookup<F, S>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<S>,
        S: AsRef<str>,
    {
        let get = |key: &str| -> Option<String> {
            lookup(key)
                .map(|value| value.as_ref().trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| get(key).with_context(|| format!("{} is not set", key));

        let screen_size = match get("PIXOO_SCREEN_SIZE") {
            Some(raw) => parse::<u32>("PIXOO_SCREEN_SIZE", &raw)?,
            None => DEFAULT_SCREEN_SIZE,
        };
        if !SUPPORTED_SCREEN_SIZES.contains(&screen_size) {
            bail!(
                "PIXOO_SCREEN_SIZE must be one of {:?}, got {}",
                SUPPORTED_SCREEN_SIZES,
                screen_size
            );
        }

        let retry_delay_secs = match get("PIXOO_RETRY_DELAY") {
            Some(raw) => parse::<u32>("PIXOO_RETRY_DELAY", &raw)?,
            None => DEFAULT_RETRY_DELAY_SECS,
        };

        let brightness = match get("PIXOO_BRIGHTNESS") {
            Some(raw) => {
                let percent = parse::<u8>("PIXOO_BRIGHTNESS", &raw)?;
                if percent > 100 {
                    bail!("PIXOO_BRIGHTNESS must be 0-100, got {}", percent);
                }
                Some(percent)
            }
            None => None,
        };

        let screen_time_secs = match get("SCREEN_TIME") {
            Some(raw) => parse::<f32>("SCREEN_TIME", &raw)?,
            None => DEFAULT_SCREEN_TIME_SECS,
        };
        if !screen_time_secs.is_finite() || screen_time_secs < 0.0 {
            bail!("SCREEN_TIME must be a non-negative number of seconds");
        }

        let utc_offset_minutes = match get("UTC_OFFSET_MINUTES") {
            Some(raw) => parse::<i32>("UTC_OFFSET_MINUTES", &raw)?,
            None => 0,
        };
        if utc_offset_minutes.abs() >= 24 * 60 {
            bail!("UTC_OFFSET_MINUTES must be within a day");
        }

        Ok(Self {
            pixoo_host: required("PIXOO_HOST")?,
            screen_size,
            retry_delay_secs,
            brightness,
            nightscout_url: required("NIGHTSCOUT_URL")?,
            screen_time_ms: (screen_time_secs * MS_PER_SECOND).round() as u32,
            label: get("DISPLAY_LABEL").unwrap_or_else(|| DEFAULT_LABEL.to_owned()),
            utc_offset_minutes,
            wifi_ssid: get("WIFI_SSID"),
            wifi_password: get("WIFI_PASSWORD"),
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: core::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{} has an invalid value {:?}", key, raw))
}

/// Values captured from the build environment
pub fn baked(key: &str) -> Option<&'static str> {
    match key {
        "PIXOO_HOST" => option_env!("PIXOO_HOST"),
        "PIXOO_SCREEN_SIZE" => option_env!("PIXOO_SCREEN_SIZE"),
        "PIXOO_RETRY_DELAY" => option_env!("PIXOO_RETRY_DELAY"),
        "PIXOO_BRIGHTNESS" => option_env!("PIXOO_BRIGHTNESS"),
        "NIGHTSCOUT_URL" => option_env!("NIGHTSCOUT_URL"),
        "SCREEN_TIME" => option_env!("SCREEN_TIME"),
        "DISPLAY_LABEL" => option_env!("DISPLAY_LABEL"),
        "UTC_OFFSET_MINUTES" => option_env!("UTC_OFFSET_MINUTES"),
        "WIFI_SSID" => option_env!("WIFI_SSID"),
        "WIFI_PASSWORD" => option_env!("WIFI_PASSWORD"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("PIXOO_HOST", "192.168.1.50"),
        ("NIGHTSCOUT_URL", "https://ns.example.com"),
    ];

    #[test]
    fn defaults_fill_optional_keys() {
        let config = config(&REQUIRED).unwrap();
        assert_eq!(config.pixoo_host, "192.168.1.50");
        assert_eq!(config.screen_size, 64);
        assert_eq!(config.retry_delay_secs, 5);
        assert_eq!(config.brightness, None);
        assert_eq!(config.screen_time_ms, 10_000);
        assert_eq!(config.label, "Nightscout");
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.wifi_ssid, None);
    }

    #[test]
    fn parses_every_key() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PIXOO_SCREEN_SIZE", "32"),
            ("PIXOO_RETRY_DELAY", "3"),
            ("PIXOO_BRIGHTNESS", "80"),
            ("SCREEN_TIME", "2.5"),
            ("DISPLAY_LABEL", "Kitchen"),
            ("UTC_OFFSET_MINUTES", "-300"),
            ("WIFI_SSID", "home"),
            ("WIFI_PASSWORD", "secret"),
        ]);
        let config = config(&pairs).unwrap();
        assert_eq!(config.screen_size, 32);
        assert_eq!(config.retry_delay_secs, 3);
        assert_eq!(config.brightness, Some(80));
        assert_eq!(config.screen_time_ms, 2500);
        assert_eq!(config.label, "Kitchen");
        assert_eq!(config.utc_offset_minutes, -300);
        assert_eq!(config.wifi_ssid.as_deref(), Some("home"));
        assert_eq!(config.wifi_password.as_deref(), Some("secret"));
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let err = config(&[("PIXOO_HOST", "pixoo.local")]).unwrap_err();
        assert!(err.to_string().contains("NIGHTSCOUT_URL"));
    }

    #[test]
    fn blank_value_counts_as_unset() {
        let err = config(&[("PIXOO_HOST", "  "), REQUIRED[1]]).unwrap_err();
        assert!(err.to_string().contains("PIXOO_HOST"));
    }

    #[test]
    fn rejects_unsupported_screen_size() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PIXOO_SCREEN_SIZE", "48"));
        assert!(config(&pairs).is_err());
    }

    #[test]
    fn rejects_bad_numbers() {
        for (key, value) in [
            ("PIXOO_RETRY_DELAY", "soon"),
            ("PIXOO_BRIGHTNESS", "101"),
            ("SCREEN_TIME", "-1"),
            ("UTC_OFFSET_MINUTES", "1440"),
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, value));
            assert!(config(&pairs).is_err(), "{} = {} should fail", key, value);
        }
    }
}
