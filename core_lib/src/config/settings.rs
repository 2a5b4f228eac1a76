use crate::checkers::{HttpCheckConfig, SystemThresholds};
use crate::health::ReportMetadata;
use config::{Config, ConfigError, Environment, File};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub report: ReportConfig,
    pub probe: ProbeConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Static fields copied onto every report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub service_id: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub release_id: Option<String>,
    pub notes: Vec<String>,
    pub links: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub mandatory_urls: Vec<String>,
    pub best_effort_urls: Vec<String>,
    /// Applied to every probe when set.
    pub timeout_ms: Option<u64>,
    /// Used when `timeout_ms` is unset.
    pub default_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub enabled: bool,
    pub cpu_warn_percent: f64,
    pub cpu_fail_percent: f64,
    pub memory_warn_percent: f64,
    pub memory_fail_percent: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            mandatory_urls: Vec::new(),
            best_effort_urls: Vec::new(),
            timeout_ms: None,
            default_timeout_ms: 5000,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        let thresholds = SystemThresholds::default();
        Self {
            enabled: true,
            cpu_warn_percent: thresholds.cpu_warn_percent,
            cpu_fail_percent: thresholds.cpu_fail_percent,
            memory_warn_percent: thresholds.memory_warn_percent,
            memory_fail_percent: thresholds.memory_fail_percent,
        }
    }
}

impl ReportConfig {
    pub fn metadata(&self) -> ReportMetadata {
        ReportMetadata {
            version: self.version.clone(),
            release_id: self.release_id.clone(),
            notes: self.notes.clone(),
            output: None,
            links: self.links.clone(),
            service_id: self.service_id.clone(),
            description: self.description.clone(),
        }
    }
}

impl ProbeConfig {
    pub fn check_config(&self) -> HttpCheckConfig {
        HttpCheckConfig {
            must_pass_urls: self.mandatory_urls.clone(),
            may_fail_urls: self.best_effort_urls.clone(),
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn has_targets(&self) -> bool {
        !self.mandatory_urls.is_empty() || !self.best_effort_urls.is_empty()
    }
}

impl SystemConfig {
    pub fn thresholds(&self) -> SystemThresholds {
        SystemThresholds {
            cpu_warn_percent: self.cpu_warn_percent,
            cpu_fail_percent: self.cpu_fail_percent,
            memory_warn_percent: self.memory_warn_percent,
            memory_fail_percent: self.memory_fail_percent,
        }
    }
}

impl AppConfig {
    /// Defaults, then `config.toml` in the working directory, then `APP_*`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("probe.mandatory_urls")
                .with_list_parse_key("probe.best_effort_urls")
                .with_list_parse_key("report.notes")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.probe.default_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Probe default timeout must be greater than 0".to_string(),
            ));
        }

        if self.probe.timeout_ms == Some(0) {
            return Err(ConfigError::Message(
                "Probe timeout must be greater than 0 when set".to_string(),
            ));
        }

        if self.system.cpu_warn_percent > self.system.cpu_fail_percent {
            return Err(ConfigError::Message(
                "CPU warn threshold cannot exceed the fail threshold".to_string(),
            ));
        }

        if self.system.memory_warn_percent > self.system.memory_fail_percent {
            return Err(ConfigError::Message(
                "Memory warn threshold cannot exceed the fail threshold".to_string(),
            ));
        }

        if self.probe.mandatory_urls.iter().chain(&self.probe.best_effort_urls).any(String::is_empty) {
            tracing::warn!("Empty probe URL configured, it will always fail");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
