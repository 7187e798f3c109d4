//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `capahub.toml` in the working directory. Every field has a
//! sensible default so the file is optional; without one the daemon runs a
//! small demo fleet. Environment variables take precedence over file values.

use std::collections::HashSet;
use std::time::Duration;

use capahub_domain::id::DeviceUuid;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub commands: CommandsConfig,
    pub polling: PollingConfig,
    /// Abilities assumed for device types that report none.
    pub known_types: Vec<KnownTypeConfig>,
    /// The simulated fleet.
    pub devices: Vec<DeviceConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Command settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Deadline for commands issued without an explicit one.
    pub default_timeout_ms: u64,
}

/// Periodic full-update settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

/// Static fallback entry.
#[derive(Debug, Clone, Deserialize)]
pub struct KnownTypeConfig {
    #[serde(rename = "type")]
    pub device_type: String,
    pub abilities: Vec<String>,
}

/// Kind of simulated appliance backing a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceKind {
    Plug,
    PlantLight,
    Diffuser,
    Humidifier,
    Hub,
}

/// One simulated device.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Generated when absent.
    #[serde(default)]
    pub uuid: Option<DeviceUuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub kind: ApplianceKind,
    #[serde(default = "default_version")]
    pub hardware_version: String,
    #[serde(default = "default_version")]
    pub firmware_version: String,
    /// Overrides the abilities the appliance reports. An empty list makes
    /// the device rely on `known_types`.
    #[serde(default)]
    pub abilities: Option<Vec<String>>,
    /// Number of outlets of a plug.
    #[serde(default = "default_outlets")]
    pub outlets: usize,
    /// Sub-devices attached to a hub.
    #[serde(default)]
    pub subdevices: Vec<SubDeviceConfig>,
}

/// One sub-device attached to a simulated hub.
#[derive(Debug, Clone, Deserialize)]
pub struct SubDeviceConfig {
    pub id: String,
    pub name: String,
    /// `ms100` or `mts100v3`.
    #[serde(rename = "type")]
    pub subdevice_type: String,
    /// Initial temperature in °C.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Initial relative humidity in percent, sensors only.
    #[serde(default = "default_humidity")]
    pub humidity: f64,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_outlets() -> usize {
    1
}

fn default_temperature() -> f64 {
    20.0
}

fn default_humidity() -> f64 {
    45.0
}

impl Config {
    /// Load configuration from `capahub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result does not validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("capahub.toml")?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("CAPAHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(ms) = var("CAPAHUB_COMMAND_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.commands.default_timeout_ms = ms;
        }
        if let Some(secs) = var("CAPAHUB_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.polling.interval_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.commands.default_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "commands.default_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.polling.enabled && self.polling.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "polling.interval_secs must be non-zero".to_string(),
            ));
        }
        let mut uuids = HashSet::new();
        for device in &self.devices {
            if let Some(uuid) = device.uuid
                && !uuids.insert(uuid)
            {
                return Err(ConfigError::Validation(format!("duplicate device uuid {uuid}")));
            }
            if !device.subdevices.is_empty() && device.kind != ApplianceKind::Hub {
                return Err(ConfigError::Validation(format!(
                    "device `{}` has sub-devices but is not a hub",
                    device.name
                )));
            }
        }
        if let Some(empty) = self.known_types.iter().find(|k| k.abilities.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "known type `{}` lists no abilities",
                empty.device_type
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.commands.default_timeout_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            commands: CommandsConfig::default(),
            polling: PollingConfig::default(),
            known_types: Vec::new(),
            devices: demo_fleet(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "capahubd=info,capahub_app=info,capahub_adapter_virtual=warn".to_string(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 5_000,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
        }
    }
}

fn device(name: &str, device_type: &str, kind: ApplianceKind) -> DeviceConfig {
    DeviceConfig {
        uuid: None,
        name: name.to_string(),
        device_type: device_type.to_string(),
        kind,
        hardware_version: default_version(),
        firmware_version: default_version(),
        abilities: None,
        outlets: default_outlets(),
        subdevices: Vec::new(),
    }
}

fn demo_fleet() -> Vec<DeviceConfig> {
    let mut hub = device("Hallway hub", "msh300", ApplianceKind::Hub);
    hub.subdevices = vec![
        SubDeviceConfig {
            id: "01008C11".to_string(),
            name: "Bedroom sensor".to_string(),
            subdevice_type: "ms100".to_string(),
            temperature: 21.5,
            humidity: default_humidity(),
        },
        SubDeviceConfig {
            id: "1C00A4F2".to_string(),
            name: "Living room valve".to_string(),
            subdevice_type: "mts100v3".to_string(),
            temperature: 19.0,
            humidity: default_humidity(),
        },
    ];
    vec![
        device("Desk plug", "mss310", ApplianceKind::Plug),
        device("Plant lamp", "bgl120a", ApplianceKind::PlantLight),
        device("Diffuser", "msxh0", ApplianceKind::Diffuser),
        hub,
    ]
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.default_timeout(), Duration::from_secs(5));
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert!(config.polling.enabled);
        assert_eq!(config.devices.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.commands.default_timeout_ms, 5_000);
        assert_eq!(config.devices.len(), 4);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [logging]
            filter = 'debug'

            [commands]
            default_timeout_ms = 250

            [polling]
            enabled = false
            interval_secs = 5

            [[known_types]]
            type = 'mss210'
            abilities = ['Appliance.Control.ToggleX']

            [[devices]]
            uuid = '6f1c0e2a9b3d4c5e8f7a6b5c4d3e2f10'
            name = 'Kettle'
            type = 'mss210'
            kind = 'plug'
            abilities = []

            [[devices]]
            name = 'Hub'
            type = 'msh300'
            kind = 'hub'

            [[devices.subdevices]]
            id = 'A1'
            name = 'Attic'
            type = 'ms100'
            temperature = 12.5
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.default_timeout(), Duration::from_millis(250));
        assert!(!config.polling.enabled);
        assert_eq!(config.known_types[0].device_type, "mss210");
        assert_eq!(config.devices.len(), 2);
        assert!(config.devices[0].uuid.is_some());
        assert_eq!(config.devices[0].abilities, Some(Vec::new()));
        assert_eq!(config.devices[1].kind, ApplianceKind::Hub);
        assert_eq!(config.devices[1].subdevices[0].temperature, 12.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.commands.default_timeout_ms, 5_000);
    }

    #[test]
    fn should_apply_env_overrides_with_rust_log_last() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("CAPAHUB_LOG", "capahubd=debug"),
            ("RUST_LOG", "trace"),
            ("CAPAHUB_COMMAND_TIMEOUT_MS", "750"),
            ("CAPAHUB_POLL_INTERVAL_SECS", "2"),
        ]));
        assert_eq!(config.logging.filter, "trace");
        assert_eq!(config.default_timeout(), Duration::from_millis(750));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn should_ignore_unparsable_env_override() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("CAPAHUB_COMMAND_TIMEOUT_MS", "soon")]));
        assert_eq!(config.commands.default_timeout_ms, 5_000);
    }

    #[test]
    fn should_reject_zero_timeout() {
        let mut config = Config::default();
        config.commands.default_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_zero_interval_when_polling_disabled() {
        let mut config = Config::default();
        config.polling.interval_secs = 0;
        assert!(config.validate().is_err());
        config.polling.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_subdevices_on_non_hub() {
        let mut config = Config::default();
        let hub_subdevices = config.devices[3].subdevices.clone();
        config.devices[0].subdevices = hub_subdevices;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_duplicate_uuids() {
        let mut config = Config::default();
        let uuid = DeviceUuid::new();
        config.devices[0].uuid = Some(uuid);
        config.devices[1].uuid = Some(uuid);
        assert!(config.validate().is_err());
    }
}
