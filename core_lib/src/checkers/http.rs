//! Concurrent HTTP probe runner
//!
//! Every target gets its own task. Mandatory ("must pass") targets can fail
//! the whole check; best-effort ("may fail") targets can raise it to `Warn`
//! at most, while their own measurements still record `Fail`.

use crate::health::{CheckOutcome, Checker, ComponentDetail, Key, Status};
use chrono::Utc;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const STATUS_MEASUREMENT: &str = "status";
pub const LATENCY_MEASUREMENT: &str = "latency";

const COMPONENT_TYPE: &str = "component";
const STATUS_UNIT: &str = "HTTP status";
const TARGET_LINK: &str = "target";

#[derive(Debug, Clone, Default)]
pub struct HttpCheckConfig {
    pub must_pass_urls: Vec<String>,
    pub may_fail_urls: Vec<String>,
    /// Per-request timeout. When unset the checker's default applies.
    pub timeout: Option<Duration>,
}

pub struct HttpCheck {
    client: reqwest::Client,
    config: HttpCheckConfig,
    default_timeout: Duration,
}

#[derive(Debug)]
struct UrlResult {
    details: Vec<ComponentDetail>,
    status: Status,
}

impl HttpCheck {
    pub fn new(client: reqwest::Client, config: HttpCheckConfig, default_timeout: Duration) -> Self {
        Self {
            client,
            config,
            default_timeout,
        }
    }

    pub fn config(&self) -> &HttpCheckConfig {
        &self.config
    }

    /// The timeout every probe of the next run will use.
    pub fn effective_timeout(&self) -> Duration {
        self.config.timeout.unwrap_or(self.default_timeout)
    }

    pub async fn run(&self) -> CheckOutcome {
        let timeout = self.effective_timeout();

        let (must_pass_tx, mut must_pass_rx) = mpsc::unbounded_channel();
        let (may_fail_tx, mut may_fail_rx) = mpsc::unbounded_channel();

        for url in &self.config.must_pass_urls {
            spawn_probe(self.client.clone(), url.clone(), timeout, must_pass_tx.clone());
        }
        for url in &self.config.may_fail_urls {
            spawn_probe(self.client.clone(), url.clone(), timeout, may_fail_tx.clone());
        }

        // Each receiver closes once its last probe has reported.
        drop(must_pass_tx);
        drop(may_fail_tx);

        let mut details = Vec::new();
        let mut overall = Status::Pass;

        let mut received = 0;
        while let Some(result) = must_pass_rx.recv().await {
            overall = raise(overall, result.status, Tier::MustPass);
            details.extend(result.details);
            received += 1;
        }
        if received != self.config.must_pass_urls.len() {
            warn!(
                "Only {} of {} mandatory probes reported",
                received,
                self.config.must_pass_urls.len()
            );
        }

        let mut received = 0;
        while let Some(result) = may_fail_rx.recv().await {
            overall = raise(overall, result.status, Tier::MayFail);
            details.extend(result.details);
            received += 1;
        }
        if received != self.config.may_fail_urls.len() {
            warn!(
                "Only {} of {} best-effort probes reported",
                received,
                self.config.may_fail_urls.len()
            );
        }

        info!(
            "HTTP probes finished: {} mandatory, {} best-effort, overall {}",
            self.config.must_pass_urls.len(),
            self.config.may_fail_urls.len(),
            overall
        );

        CheckOutcome::new(details, overall)
    }
}

#[async_trait::async_trait]
impl Checker for HttpCheck {
    async fn check(&self) -> CheckOutcome {
        self.run().await
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    MustPass,
    MayFail,
}

/// Best-effort results never push the overall status past `Warn`, but they
/// never lower one either.
fn raise(overall: Status, result: Status, tier: Tier) -> Status {
    match tier {
        Tier::MustPass => overall.max(result),
        Tier::MayFail => overall.max(result.min(Status::Warn)),
    }
}

fn spawn_probe(
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    results: mpsc::UnboundedSender<UrlResult>,
) {
    tokio::spawn(async move {
        let result = check_url(&client, &url, timeout).await;
        if results.send(result).is_err() {
            debug!("Probe result for {} dropped, runner no longer listening", url);
        }
    });
}

async fn check_url(client: &reqwest::Client, url: &str, timeout: Duration) -> UrlResult {
    let start_time = Utc::now();
    let start = Instant::now();

    let base = |measurement: &str, status: Status| {
        ComponentDetail::new(Key::new(url, measurement), status)
            .with_component_type(COMPONENT_TYPE)
            .with_time(start_time)
            .with_link(TARGET_LINK, url)
    };

    let response = match client.get(url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(err) => {
            let output = error_chain(&err);
            debug!("Probe of {} failed before a response: {}", url, output);
            return UrlResult {
                details: vec![base(STATUS_MEASUREMENT, Status::Fail).with_output(output)],
                status: Status::Fail,
            };
        }
    };
    let elapsed = start.elapsed();

    let code = response.status();
    let status = if code.as_u16() / 100 == 2 {
        Status::Pass
    } else {
        Status::Fail
    };
    debug!("Probe of {} returned {} in {:?}", url, code, elapsed);

    let mut status_detail = base(STATUS_MEASUREMENT, status)
        .with_observed_value(code.as_u16())
        .with_observed_unit(STATUS_UNIT);
    if status != Status::Pass {
        status_detail = status_detail.with_output(code.to_string());
    }

    let latency_detail = base(LATENCY_MEASUREMENT, Status::Pass).with_observed_value(elapsed);

    UrlResult {
        details: vec![status_detail, latency_detail],
        status,
    }
}

/// reqwest's top-level message rarely names the cause ("error sending
/// request"), so the source chain is appended.
fn error_chain(err: &reqwest::Error) -> String {
    let mut output = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        output.push_str(": ");
        output.push_str(&cause.to_string());
        source = cause.source();
    }
    output
}
