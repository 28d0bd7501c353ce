//! # netharvest
//!
//! Collects command output from network devices over SSH into a spreadsheet.
//!
//! A template workbook lists the devices (first sheet, row 13 from column B)
//! and a dictionary of named commands (second sheet, columns A and B). Every
//! command is run on every device in a privileged session, and the outputs
//! are written to a result workbook with one row per device and one column
//! per command variable. A device that cannot be reached or logged into is
//! reported and skipped; it never stops the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netharvest::{BatchRunner, Credentials, SshConnector, load_template, write_workbook};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netharvest::Error> {
//!     let template = load_template("devices.xlsx")?;
//!     let credentials = Credentials::new("netops", "secret");
//!
//!     let runner = BatchRunner::new(SshConnector::new());
//!     let report = runner.run(&template, &credentials).await;
//!
//!     write_workbook(&report.results, "devices-results.xlsx")?;
//!     for failure in &report.failures {
//!         println!("{failure}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod batch;
pub mod channel;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod interrupt;
pub mod inventory;
pub mod logging;
pub mod output;
pub mod platform;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use app::{RunOutcome, run_collection};
pub use batch::{BatchReport, BatchRunner, DeviceFailure, ExecutionResults};
pub use config::RunConfig;
pub use credentials::{CredentialPrompt, Credentials, TerminalPrompt, obtain_credentials};
pub use driver::{DriverBuilder, GenericDriver, Response};
pub use error::{Error, FailureKind};
pub use inventory::{DeviceTarget, Template, load_template};
pub use output::write_workbook;
pub use session::{CommandOutput, Session, SessionConnector, SshConnector, run_session};
pub use transport::{HostKeyVerification, SshConfig};
