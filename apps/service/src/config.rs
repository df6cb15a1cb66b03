use std::net::IpAddr;
use std::time::Duration;
use std::{env, fmt, fs, io, path};

use linkwatch::MonitorSettings;
use linkwatch::settings::{
    DEFAULT_EVALUATION_MULTIPLIER, DEFAULT_EXTERNAL_HOST, DEFAULT_LATENCY_THRESHOLD,
    DEFAULT_LOG_PATH, DEFAULT_PAYLOAD_SIZE, DEFAULT_PROBE_TIMEOUT, DEFAULT_SAMPLING_PERIOD,
};
use linkwatch::SettingsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {}: {source}", .path.display())]
    ReadFailed { path: path::PathBuf, source: io::Error },
    #[error("failed to write config {}: {source}", .path.display())]
    WriteFailed { path: path::PathBuf, source: io::Error },
    #[error("failed to parse config {}: {source}", .path.display())]
    ParseFailed { path: path::PathBuf, source: toml::de::Error },
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config path available: set XDG_CONFIG_HOME or HOME, or pass --config")]
    ConfigPathUnavailable,
    #[error("invalid configuration: {0}")]
    Invalid(#[from] SettingsError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: Target,
    pub probe: Probe,
    pub sampling: Sampling,
    pub output: Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    /// Host probed on the external path
    pub host: String,
    /// Skip the routing table lookup and probe this gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Probe {
    pub timeout_ms: u64,
    pub payload_size: usize,
    pub dont_fragment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sampling {
    pub interval_ms: u64,
    pub latency_threshold_ms: u64,
    /// Evaluator cycle as a multiple of `interval_ms`
    pub evaluation_multiplier: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub log_path: path::PathBuf,
    pub echo_to_console: bool,
}

impl Default for Target {
    fn default() -> Self {
        Self { host: DEFAULT_EXTERNAL_HOST.into(), gateway: None }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            timeout_ms: millis(DEFAULT_PROBE_TIMEOUT),
            payload_size: DEFAULT_PAYLOAD_SIZE,
            dont_fragment: true,
        }
    }
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            interval_ms: millis(DEFAULT_SAMPLING_PERIOD),
            latency_threshold_ms: millis(DEFAULT_LATENCY_THRESHOLD),
            evaluation_multiplier: DEFAULT_EVALUATION_MULTIPLIER,
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self { log_path: DEFAULT_LOG_PATH.into(), echo_to_console: true }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/linkwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("linkwatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Monitor Configuration:")?;
        write_title_1(f, "Target")?;
        write_1(f, "Host", &self.target.host)?;
        match &self.target.gateway {
            Some(gateway) => write_1(f, "Gateway", gateway)?,
            None => write_1(f, "Gateway", &"(routing table)")?,
        }
        write_title_1(f, "Probe")?;
        write_1(f, "Timeout (ms)", &self.probe.timeout_ms)?;
        write_1(f, "Payload (bytes)", &self.probe.payload_size)?;
        write_1(f, "Don't Fragment", &self.probe.dont_fragment)?;
        write_title_1(f, "Sampling")?;
        write_1(f, "Interval (ms)", &self.sampling.interval_ms)?;
        write_1(f, "Latency Threshold (ms)", &self.sampling.latency_threshold_ms)?;
        write_1(f, "Evaluation Multiplier", &self.sampling.evaluation_multiplier)?;
        write_title_1(f, "Output")?;
        write_1(f, "Log Path", &self.output.log_path.display())?;
        write_1(f, "Echo To Console", &self.output.echo_to_console)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/linkwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```rust,ignore
    /// let cfg = config::Config::from_config(None::<&path::Path>)?;
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| Error::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())
                .map_err(|source| Error::ParseFailed { path: config_path, source })
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;
        let write_failed = |source| Error::WriteFailed { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }

        fs::write(path, config_str).map_err(write_failed)
    }

    /// Convert into validated monitor settings
    pub fn to_settings(&self) -> Result<MonitorSettings, Error> {
        let settings = MonitorSettings {
            external_host: self.target.host.clone(),
            probe_timeout: Duration::from_millis(self.probe.timeout_ms),
            payload_size: self.probe.payload_size,
            dont_fragment: self.probe.dont_fragment,
            sampling_period: Duration::from_millis(self.sampling.interval_ms),
            latency_threshold: Duration::from_millis(self.sampling.latency_threshold_ms),
            evaluation_multiplier: self.sampling.evaluation_multiplier,
            log_path: self.output.log_path.clone(),
            echo_to_console: self.output.echo_to_console,
        };
        settings.validate()?;
        Ok(settings)
    }
}
