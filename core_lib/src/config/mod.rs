pub mod settings;

pub use settings::{AppConfig, ProbeConfig, ReportConfig, ServerConfig, SystemConfig};
