//! Batch orchestration over the device roster.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::credentials::Credentials;
use crate::error::FailureKind;
use crate::inventory::Template;
use crate::session::{DeviceState, SessionConnector, run_session};

const BANNER_WIDTH: usize = 80;

/// Collected output of one device, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRow {
    pub host: String,
    pub values: IndexMap<String, String>,
}

/// Output of every device that completed, in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResults {
    /// Variable names in dictionary order.
    pub variables: Vec<String>,
    pub rows: Vec<DeviceRow>,
}

impl ExecutionResults {
    pub fn new(variables: Vec<String>) -> Self {
        Self {
            variables,
            rows: Vec::new(),
        }
    }

    /// Values collected from `host`. A host listed twice yields its first row.
    pub fn get(&self, host: &str) -> Option<&IndexMap<String, String>> {
        self.rows.iter().find(|r| r.host == host).map(|r| &r.values)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A device that could not be collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFailure {
    pub host: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl DeviceFailure {
    /// The line printed when the device is given up on.
    pub fn console_line(&self) -> String {
        format!("Failed to connect: {self} ({})", self.detail)
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.host, self.kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub results: ExecutionResults,
    pub failures: Vec<DeviceFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Runs every dictionary command on every roster device, one device at a
/// time. A device failure is recorded and the run moves on.
pub struct BatchRunner<C> {
    connector: C,
}

impl<C: SessionConnector> BatchRunner<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn run(&self, template: &Template, credentials: &Credentials) -> BatchReport {
        let variables: Vec<String> = template.commands.keys().cloned().collect();
        let commands: Vec<&str> = template.commands.values().map(String::as_str).collect();

        let mut report = BatchReport {
            results: ExecutionResults::new(variables),
            failures: Vec::new(),
        };

        for target in &template.roster {
            debug!("{}: {}", target.host, DeviceState::Pending);
            println!("{}", "-".repeat(BANNER_WIDTH));
            println!("Connecting to {}...", target.host);
            info!("Connecting to {}", target.host);

            match run_session(&self.connector, target, credentials, &commands).await {
                Ok(outputs) => {
                    let values = report
                        .results
                        .variables
                        .iter()
                        .cloned()
                        .zip(outputs.into_iter().map(|o| o.output))
                        .collect();
                    info!("{}: collected {} output(s)", target.host, commands.len());
                    report.results.rows.push(DeviceRow {
                        host: target.host.clone(),
                        values,
                    });
                }
                Err(e) => {
                    let failure = DeviceFailure {
                        host: target.host.clone(),
                        kind: e.failure_kind(),
                        detail: e.to_string(),
                    };
                    println!("{}", failure.console_line());
                    warn!("{}: {} ({})", failure, DeviceState::Failed, failure.detail);
                    report.failures.push(failure);
                }
            }
        }

        info!(
            "Batch complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }
}
