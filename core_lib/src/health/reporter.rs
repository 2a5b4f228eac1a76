//! Checker contract and the reporter that runs checkers into one report

use super::{CheckOutcome, Health, ReportMetadata, Status};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The extension point: anything that can produce dated, keyed measurements
/// plus one overall status.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self) -> CheckOutcome;
    fn name(&self) -> &str;
}

#[derive(Default)]
pub struct HealthReporter {
    checkers: Vec<Arc<dyn Checker>>,
    metadata: ReportMetadata,
}

impl HealthReporter {
    pub fn new(metadata: ReportMetadata) -> Self {
        Self {
            checkers: Vec::new(),
            metadata,
        }
    }

    pub fn add_check<T: Checker + 'static>(mut self, checker: T) -> Self {
        self.checkers.push(Arc::new(checker));
        self
    }

    pub fn add_shared_check(mut self, checker: Arc<dyn Checker>) -> Self {
        self.checkers.push(checker);
        self
    }

    pub fn checker_names(&self) -> Vec<&str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }

    /// Runs every checker exactly once, in registration order.
    pub async fn report(&self) -> Health {
        info!("Running health checks for {} checkers", self.checkers.len());

        let mut outcomes = Vec::with_capacity(self.checkers.len());
        for checker in &self.checkers {
            let name = checker.name();
            let start = Instant::now();

            let outcome = checker.check().await;
            let elapsed = start.elapsed();

            match outcome.status {
                Status::Pass => {
                    info!("Checker '{}' passed in {:?} with {} measurements", name, elapsed, outcome.details.len());
                }
                Status::Warn => {
                    warn!("Checker '{}' warned in {:?} with {} measurements", name, elapsed, outcome.details.len());
                }
                Status::Fail => {
                    error!("Checker '{}' failed in {:?} with {} measurements", name, elapsed, outcome.details.len());
                }
            }

            outcomes.push(outcome);
        }

        let health = Health::assemble(outcomes).with_metadata(&self.metadata);
        info!("Health check completed - Overall status: {}", health.status());
        health
    }
}
