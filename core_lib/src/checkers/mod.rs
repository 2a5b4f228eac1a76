pub mod http;
pub mod system;

pub use http::{HttpCheck, HttpCheckConfig, LATENCY_MEASUREMENT, STATUS_MEASUREMENT};
pub use system::{SystemCheck, SystemSample, SystemThresholds};
