//! One collection run: credentials, batch, result workbook.

use std::path::Path;

use log::warn;

use crate::batch::{BatchReport, BatchRunner};
use crate::credentials::{CredentialPrompt, SecretPrompt, obtain_credentials};
use crate::error::Result;
use crate::interrupt::CANCELLED_STATUS;
use crate::inventory::Template;
use crate::output::write_workbook;
use crate::session::SessionConnector;

#[derive(Debug)]
pub enum RunOutcome {
    /// Every device was attempted and the workbook saved.
    Completed(BatchReport),

    /// The operator cancelled the prompt; no device was contacted.
    Cancelled,
}

impl RunOutcome {
    pub fn exit_status(&self) -> i32 {
        match self {
            RunOutcome::Completed(_) => 0,
            RunOutcome::Cancelled => CANCELLED_STATUS,
        }
    }
}

/// Ask `prompt` for the secret, run every command of `template` on every
/// device and save the results to `output`.
///
/// Device failures are part of the report. Errors are only returned for the
/// prompt itself and for the workbook.
pub async fn run_collection<P, C>(
    template: &Template,
    username: String,
    prompt: P,
    runner: &BatchRunner<C>,
    output: &Path,
) -> Result<RunOutcome>
where
    P: SecretPrompt,
    C: SessionConnector,
{
    let credentials = match obtain_credentials(prompt, username).await? {
        CredentialPrompt::Provided(credentials) => credentials,
        CredentialPrompt::Cancelled => {
            warn!("credential prompt cancelled, no device contacted");
            return Ok(RunOutcome::Cancelled);
        }
    };

    let report = runner.run(template, &credentials).await;
    write_workbook(&report.results, output)?;
    Ok(RunOutcome::Completed(report))
}
