#![deny(unsafe_code)]

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use config::{Config, File};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use mobile_utils::deserialize_duration;

use self::logging::{Level, Log};

pub use self::options::Options;

pub mod logging;
pub mod options;

static SETTINGS: OnceCell<Settings> = OnceCell::new();

#[derive(Clone)]
pub struct Settings(Arc<Inner>);

#[derive(Debug, Clone, Deserialize)]
pub struct Inner {
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub datastore: Datastore,
    #[serde(default)]
    pub configuration: Configuration,
    #[serde(default, skip)]
    pub opts: Options,
}

impl Deref for Settings {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Settings {
    pub fn new(opts: Options) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(File::with_name("/etc/campaign-classic/mobile").required(false))
            .add_source(File::with_name("mobile").required(false))
            .add_source(config::Environment::with_prefix("mobile").separator("__").try_parsing(true));

        if let Some(cfg) = opts.cfg_name.as_ref() {
            builder = builder.add_source(File::with_name(cfg).required(true));
        }

        let mut inner: Inner = builder.build()?.try_deserialize()?;

        //Command line configuration overriding file configuration
        if let Some(file) = opts.configuration_file.as_ref() {
            inner.configuration.file = Some(file.clone());
        }
        if let Some(privacy) = opts.privacy.as_ref() {
            inner.configuration.privacy = Some(privacy.clone());
        }
        if let Some(level) = opts.log_level.as_ref() {
            inner.log.level = Level::from_str(level)?;
        }

        inner.opts = opts;
        Ok(Self(Arc::new(inner)))
    }

    #[inline]
    pub fn instance() -> &'static Self {
        match SETTINGS.get() {
            Some(c) => c,
            None => {
                unreachable!("Settings not initialized");
            }
        }
    }

    #[inline]
    pub fn init(opts: Options) -> Result<&'static Self> {
        SETTINGS.set(Settings::new(opts)?).map_err(|_| anyhow!("Settings init failed"))?;
        SETTINGS.get().ok_or_else(|| anyhow!("Settings init failed"))
    }

    #[inline]
    pub fn logs() -> Result<()> {
        let cfg = Self::instance();
        log::debug!("Config info is {:?}", cfg.0);
        log::info!("log level is {}", cfg.log.level);
        log::info!("network config is: {:?}", cfg.network);
        log::info!("datastore config is: {:?}", cfg.datastore);
        if let Some(file) = cfg.configuration.file.as_ref() {
            log::info!("configuration file is {}", file);
        }
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Settings ...")?;
        Ok(())
    }
}

/// Client-wide limits of the reference HTTP networking service. Each request
/// still carries its own connect/read timeout.
#[derive(Debug, Clone, Deserialize)]
pub struct Network {
    #[serde(default = "Network::connect_timeout_default", deserialize_with = "deserialize_duration")]
    pub connect_timeout: Duration,
    #[serde(default = "Network::read_timeout_default", deserialize_with = "deserialize_duration")]
    pub read_timeout: Duration,
    #[serde(default = "Network::user_agent_default")]
    pub user_agent: String,
}

impl Default for Network {
    #[inline]
    fn default() -> Self {
        Self {
            connect_timeout: Self::connect_timeout_default(),
            read_timeout: Self::read_timeout_default(),
            user_agent: Self::user_agent_default(),
        }
    }
}

impl Network {
    fn connect_timeout_default() -> Duration {
        Duration::from_secs(30)
    }
    fn read_timeout_default() -> Duration {
        Duration::from_secs(30)
    }
    fn user_agent_default() -> String {
        concat!("campaign-classic-rs/", env!("CARGO_PKG_VERSION")).into()
    }
}

/// Static device attributes reported by the reference host.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default = "Device::os_name_default")]
    pub os_name: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

impl Default for Device {
    #[inline]
    fn default() -> Self {
        Self {
            unique_id: None,
            name: None,
            model: None,
            brand: None,
            manufacturer: None,
            os_name: Self::os_name_default(),
            os_version: None,
            locale: None,
        }
    }
}

impl Device {
    fn os_name_default() -> Option<String> {
        Some("Android".into())
    }
}

#[derive(Default, Debug, Clone, Deserialize)]
pub struct Datastore {
    //JSON file backing the named collections, in-memory only when absent
    #[serde(default)]
    pub path: Option<String>,
}

/// Where the configuration shared state comes from.
///
/// Configuration keys are case sensitive (`campaignclassic.marketingServer`), so
/// they are read from a JSON file rather than through the settings loader.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
}

impl Configuration {
    /// Loads the configuration map, applying the privacy override if set.
    pub fn load(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let mut map = match self.file.as_ref() {
            Some(file) => {
                let data = std::fs::read_to_string(file)
                    .map_err(|e| anyhow!("read configuration file {} error, {:?}", file, e))?;
                match serde_json::from_str::<serde_json::Value>(&data)? {
                    serde_json::Value::Object(map) => map,
                    _ => return Err(anyhow!("configuration file {} is not a JSON object", file)),
                }
            }
            None => serde_json::Map::new(),
        };
        if let Some(privacy) = self.privacy.as_ref() {
            map.insert("global.privacy".into(), serde_json::Value::String(privacy.clone()));
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::new(Options::default()).expect("Settings creation failed");
        assert_eq!(settings.network.connect_timeout, Duration::from_secs(30));
        assert_eq!(settings.device.os_name.as_deref(), Some("Android"));
        assert!(settings.datastore.path.is_none());
    }

    #[test]
    fn test_device_defaults_without_section() {
        assert_eq!(Device::default().os_name.as_deref(), Some("Android"));
        let inner: Inner = serde_json::from_str("{}").expect("deserialize settings failed");
        assert_eq!(inner.device.os_name.as_deref(), Some("Android"));
        assert!(inner.device.unique_id.is_none());
    }

    #[test]
    fn test_command_line_overrides() {
        let opts = Options {
            privacy: Some("optedin".into()),
            log_level: Some("debug".into()),
            ..Default::default()
        };
        let settings = Settings::new(opts).expect("Settings creation failed");
        assert_eq!(settings.log.level.level_filter(), log::LevelFilter::Debug);

        let map = settings.configuration.load().expect("load configuration failed");
        assert_eq!(map.get("global.privacy").and_then(|v| v.as_str()), Some("optedin"));
    }

    #[test]
    fn test_invalid_log_level() {
        let opts = Options { log_level: Some("loud".into()), ..Default::default() };
        assert!(Settings::new(opts).is_err());
    }
}
