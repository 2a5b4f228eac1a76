//! The health report document
//!
//! See: https://inadarei.github.io/rfc-healthcheck/#api-health-response

use super::sparse::{empty_as_none, is_blank};
use super::{Checks, ComponentDetail, Status};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What a single checker run produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckOutcome {
    pub details: Vec<ComponentDetail>,
    pub status: Status,
}

impl CheckOutcome {
    pub fn new(details: Vec<ComponentDetail>, status: Status) -> Self {
        Self { details, status }
    }
}

/// Static, service-level fields copied onto every assembled report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportMetadata {
    pub version: Option<String>,
    pub release_id: Option<String>,
    pub notes: Vec<String>,
    pub output: Option<String>,
    pub links: IndexMap<String, String>,
    pub service_id: Option<String>,
    pub description: Option<String>,
}

/// `status` has no setter: an assembled report's status is the worst-of
/// every contributing checker's status. A decoded report keeps the status it
/// was sent with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    status: Status,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub release_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Checks::is_empty")]
    checks: Checks,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub service_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub description: Option<String>,
}

impl Health {
    /// Merges every outcome's measurements under their own keys and folds
    /// the outcome statuses with worst-of, starting from `Pass`.
    pub fn assemble<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = CheckOutcome>,
    {
        let mut checks = Checks::new();
        let mut status = Status::Pass;

        for outcome in outcomes {
            checks.add_details(outcome.details);
            status = status.max(outcome.status);
        }

        Self {
            status,
            checks,
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: &ReportMetadata) -> Self {
        self.version = metadata.version.clone();
        self.release_id = metadata.release_id.clone();
        self.notes = metadata.notes.clone();
        self.output = metadata.output.clone();
        self.links = metadata.links.clone();
        self.service_id = metadata.service_id.clone();
        self.description = metadata.description.clone();
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn checks(&self) -> &Checks {
        &self.checks
    }

    pub fn into_checks(self) -> Checks {
        self.checks
    }

    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(data: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
