//! Host resource checker: CPU utilization, memory utilization and uptime

use crate::health::{CheckOutcome, Checker, ComponentDetail, Key, ObservedValue, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::{debug, warn};

const COMPONENT_TYPE: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemSample {
    pub cpu_usage_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub uptime_seconds: u64,
}

impl SystemSample {
    pub fn memory_usage_percent(&self) -> f64 {
        if self.memory_total_bytes > 0 {
            (self.memory_used_bytes as f64 / self.memory_total_bytes as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Blocks for the minimum CPU refresh interval so the usage figure is a
    /// real delta rather than the zero of a first refresh.
    pub fn collect() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu();
        system.refresh_memory();

        let sample = Self {
            cpu_usage_percent: system.global_cpu_info().cpu_usage(),
            memory_used_bytes: system.used_memory(),
            memory_total_bytes: system.total_memory(),
            uptime_seconds: System::uptime(),
        };

        debug!(
            "Collected system sample: CPU: {:.1}%, Memory: {:.1}%",
            sample.cpu_usage_percent,
            sample.memory_usage_percent()
        );
        sample
    }
}

/// Percent thresholds at which a reading becomes `Warn` / `Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemThresholds {
    pub cpu_warn_percent: f64,
    pub cpu_fail_percent: f64,
    pub memory_warn_percent: f64,
    pub memory_fail_percent: f64,
}

impl Default for SystemThresholds {
    fn default() -> Self {
        Self {
            cpu_warn_percent: 80.0,
            cpu_fail_percent: 95.0,
            memory_warn_percent: 80.0,
            memory_fail_percent: 95.0,
        }
    }
}

pub fn classify(value: f64, warn_at: f64, fail_at: f64) -> Status {
    if value >= fail_at {
        Status::Fail
    } else if value >= warn_at {
        Status::Warn
    } else {
        Status::Pass
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemCheck {
    thresholds: SystemThresholds,
}

impl SystemCheck {
    pub fn new(thresholds: SystemThresholds) -> Self {
        Self { thresholds }
    }

    pub fn evaluate(&self, sample: &SystemSample, time: DateTime<Utc>) -> CheckOutcome {
        let t = &self.thresholds;

        let cpu = f64::from(sample.cpu_usage_percent);
        let cpu_status = classify(cpu, t.cpu_warn_percent, t.cpu_fail_percent);
        let mut cpu_detail = percent_detail(Key::new("cpu", "utilization"), cpu, cpu_status, time);
        if cpu_status != Status::Pass {
            cpu_detail = cpu_detail.with_output(format!(
                "CPU utilization {:.1}% exceeds {:.1}%",
                cpu,
                threshold_for(cpu_status, t.cpu_warn_percent, t.cpu_fail_percent)
            ));
        }

        let memory = sample.memory_usage_percent();
        let memory_status = classify(memory, t.memory_warn_percent, t.memory_fail_percent);
        let mut memory_detail =
            percent_detail(Key::new("memory", "utilization"), memory, memory_status, time)
                .with_property("usedBytes", serde_json::json!(sample.memory_used_bytes))
                .with_property("totalBytes", serde_json::json!(sample.memory_total_bytes));
        if memory_status != Status::Pass {
            memory_detail = memory_detail.with_output(format!(
                "Memory utilization {:.1}% exceeds {:.1}%",
                memory,
                threshold_for(memory_status, t.memory_warn_percent, t.memory_fail_percent)
            ));
        }

        let uptime_detail = ComponentDetail::new(Key::component("uptime"), Status::Pass)
            .with_component_type(COMPONENT_TYPE)
            .with_observed_value(sample.uptime_seconds)
            .with_observed_unit("s")
            .with_time(time);

        let status = cpu_status.max(memory_status);
        CheckOutcome::new(vec![cpu_detail, memory_detail, uptime_detail], status)
    }
}

#[async_trait::async_trait]
impl Checker for SystemCheck {
    async fn check(&self) -> CheckOutcome {
        let time = Utc::now();
        match tokio::task::spawn_blocking(SystemSample::collect).await {
            Ok(sample) => self.evaluate(&sample, time),
            Err(err) => {
                warn!("Unable to sample system resources: {}", err);
                let detail = ComponentDetail::new(Key::component("system"), Status::Warn)
                    .with_component_type(COMPONENT_TYPE)
                    .with_time(time)
                    .with_output(format!("unable to sample system resources: {}", err));
                CheckOutcome::new(vec![detail], Status::Warn)
            }
        }
    }

    fn name(&self) -> &str {
        "system"
    }
}

fn percent_detail(key: Key, value: f64, status: Status, time: DateTime<Utc>) -> ComponentDetail {
    let mut detail = ComponentDetail::new(key, status)
        .with_component_type(COMPONENT_TYPE)
        .with_observed_unit("percent")
        .with_time(time);
    // Rounded to one decimal to keep the wire value readable.
    if let Some(value) = ObservedValue::from_f64((value * 10.0).round() / 10.0) {
        detail = detail.with_observed_value(value);
    }
    detail
}

fn threshold_for(status: Status, warn_at: f64, fail_at: f64) -> f64 {
    if status == Status::Fail {
        fail_at
    } else {
        warn_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(cpu: f32, used: u64, total: u64) -> SystemSample {
        SystemSample {
            cpu_usage_percent: cpu,
            memory_used_bytes: used,
            memory_total_bytes: total,
            uptime_seconds: 1209600,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 1, 17, 3, 36, 48).unwrap()
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(10.0, 80.0, 95.0), Status::Pass);
        assert_eq!(classify(80.0, 80.0, 95.0), Status::Warn);
        assert_eq!(classify(99.0, 80.0, 95.0), Status::Fail);
    }

    #[test]
    fn test_memory_percent_with_zero_total() {
        assert_eq!(sample(0.0, 10, 0).memory_usage_percent(), 0.0);
        assert_eq!(sample(0.0, 50, 100).memory_usage_percent(), 50.0);
    }

    #[test]
    fn test_evaluate_healthy_sample() {
        let outcome = SystemCheck::default().evaluate(&sample(12.5, 40, 100), at());

        assert_eq!(outcome.status, Status::Pass);
        let keys: Vec<_> = outcome.details.iter().map(|d| d.key.to_string()).collect();
        assert_eq!(keys, vec!["cpu:utilization", "memory:utilization", "uptime"]);
        assert!(outcome.details.iter().all(|d| d.output.is_none()));
        assert_eq!(outcome.details[0].observed_value.as_ref().and_then(|v| v.as_f64()), Some(12.5));
        assert_eq!(outcome.details[2].observed_value.as_ref().and_then(|v| v.as_u64()), Some(1209600));
    }

    #[test]
    fn test_evaluate_reports_worst_reading() {
        let outcome = SystemCheck::default().evaluate(&sample(85.0, 96, 100), at());

        assert_eq!(outcome.status, Status::Fail);
        assert_eq!(outcome.details[0].status, Status::Warn);
        assert_eq!(outcome.details[1].status, Status::Fail);
        assert!(outcome.details[1].output.as_deref().unwrap().contains("95.0%"));
        assert_eq!(
            outcome.details[1].property("usedBytes"),
            Some(&serde_json::json!(96))
        );
    }
}
