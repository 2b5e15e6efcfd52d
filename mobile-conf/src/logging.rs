use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Where and how verbosely the host writes its log.
#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    #[serde(default = "Log::to_default")]
    pub to: To,
    #[serde(default = "Log::level_default")]
    pub level: Level,
    #[serde(default = "Log::dir_default")]
    pub dir: String,
    #[serde(default = "Log::file_default")]
    pub file: String,
}

impl Default for Log {
    #[inline]
    fn default() -> Self {
        Self {
            to: Self::to_default(),
            level: Self::level_default(),
            dir: Self::dir_default(),
            file: Self::file_default(),
        }
    }
}

impl Log {
    #[inline]
    fn to_default() -> To {
        To::Console
    }
    #[inline]
    fn level_default() -> Level {
        Level(slog::Level::Info)
    }
    #[inline]
    fn dir_default() -> String {
        "/var/log/campaign-classic".into()
    }
    #[inline]
    fn file_default() -> String {
        "mobile.log".into()
    }

    /// Full path of the log file, `None` when no file name is configured.
    #[inline]
    pub fn filename(&self) -> Option<PathBuf> {
        if self.file.is_empty() {
            return None;
        }
        if self.dir.is_empty() {
            return Some(PathBuf::from(&self.file));
        }
        Some(PathBuf::from(self.dir.trim_end_matches(['/', '\\'])).join(&self.file))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum To {
    Off,
    File,
    Console,
    Both,
}

impl To {
    #[inline]
    pub fn file(&self) -> bool {
        matches!(self, To::Both | To::File)
    }
    #[inline]
    pub fn console(&self) -> bool {
        matches!(self, To::Both | To::Console)
    }
    #[inline]
    pub fn off(&self) -> bool {
        matches!(self, To::Off)
    }
}

impl<'de> Deserialize<'de> for To {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let to = match String::deserialize(deserializer)?.to_ascii_lowercase().as_str() {
            "off" => To::Off,
            "file" => To::File,
            "console" => To::Console,
            _ => To::Both,
        };
        Ok(to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level(slog::Level);

impl Level {
    #[inline]
    pub fn inner(&self) -> slog::Level {
        self.0
    }

    /// The equivalent filter for the `log` facade used by the extensions.
    #[inline]
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.0 {
            slog::Level::Trace => log::LevelFilter::Trace,
            slog::Level::Debug => log::LevelFilter::Debug,
            slog::Level::Info => log::LevelFilter::Info,
            slog::Level::Warning => log::LevelFilter::Warn,
            slog::Level::Error | slog::Level::Critical => log::LevelFilter::Error,
        }
    }
}

impl Deref for Level {
    type Target = slog::Level;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        slog::Level::from_str(s).map(Level).map_err(|_| anyhow::anyhow!("invalid log level: {}", s))
    }
}

impl<'de> Deserialize<'de> for Level {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level = String::deserialize(deserializer)?;
        Level::from_str(&level).map_err(de::Error::custom)
    }
}
