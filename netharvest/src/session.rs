//! Per-device session runner.
//!
//! A session is one authenticated shell on one device. The runner opens
//! it, elevates to privileged mode, runs every command, and closes it.
//! Collection logic only sees the [`Session`] and [`SessionConnector`]
//! traits; [`SshConnector`] is the SSH implementation of both.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use log::{debug, warn};
use secrecy::ExposeSecret;

use crate::credentials::Credentials;
use crate::driver::{DriverBuilder, GenericDriver};
use crate::error::Result;
use crate::inventory::DeviceTarget;
use crate::transport::{HostKeyVerification, Transport};

/// An open, authenticated session on one device.
pub trait Session: Send {
    /// Enter privileged mode using the session's secret.
    fn elevate(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Run one command and return its output text.
    fn execute(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// End the session.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sessions to device targets.
pub trait SessionConnector: Sync {
    type Session: Session;

    /// Connect and log in. Fails with a transport timeout when the device
    /// cannot be reached and with an authentication error when the login
    /// is rejected.
    fn connect(
        &self,
        target: &DeviceTarget,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Lifecycle of one device within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Pending,
    Connecting,
    Connected,
    Executing,
    Closed,
    Failed,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One command and the text it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub output: String,
}

/// Run `commands` on `target` in one session.
///
/// Outputs come back in command order. Any error after login ends the
/// session early: it is closed on a best-effort basis and the error is
/// returned. A failed close after every command succeeded is only logged.
pub async fn run_session<C: SessionConnector>(
    connector: &C,
    target: &DeviceTarget,
    credentials: &Credentials,
    commands: &[&str],
) -> Result<Vec<CommandOutput>> {
    let host = target.host.as_str();

    debug!("{host}: {}", DeviceState::Connecting);
    let mut session = connector.connect(target, credentials).await?;
    debug!("{host}: {}", DeviceState::Connected);

    let collected = collect(&mut session, host, commands).await;
    let closed = session.close().await;

    match (collected, closed) {
        (Ok(outputs), Ok(())) => {
            debug!("{host}: {}", DeviceState::Closed);
            Ok(outputs)
        }
        (Ok(outputs), Err(e)) => {
            warn!("{host}: close failed after collection: {e}");
            Ok(outputs)
        }
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                debug!("{host}: close after failure also failed: {close_err}");
            }
            Err(e)
        }
    }
}

async fn collect<S: Session>(
    session: &mut S,
    host: &str,
    commands: &[&str],
) -> Result<Vec<CommandOutput>> {
    session.elevate().await?;
    debug!("{host}: {} {} command(s)", DeviceState::Executing, commands.len());

    let mut outputs = Vec::with_capacity(commands.len());
    for command in commands {
        let output = session.execute(command).await?;
        outputs.push(CommandOutput {
            command: command.to_string(),
            output,
        });
    }
    Ok(outputs)
}

/// Opens SSH sessions with [`GenericDriver`].
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SshConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_key_verification(mut self, policy: HostKeyVerification) -> Self {
        self.host_key_verification = policy;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }
}

impl SessionConnector for SshConnector {
    type Session = GenericDriver;

    async fn connect(
        &self,
        target: &DeviceTarget,
        credentials: &Credentials,
    ) -> Result<GenericDriver> {
        let secret = credentials.secret().expose_secret();

        let mut builder = DriverBuilder::new(&target.host)
            .port(target.port)
            .username(&credentials.username)
            .password(secret)
            .enable_secret(secret)
            .platform(&target.platform)
            .timeout(target.timeout)
            .host_key_verification(self.host_key_verification);
        if let Some(ref path) = self.known_hosts_path {
            builder = builder.known_hosts_path(path);
        }

        let mut driver = builder.build()?;
        driver.open().await?;
        Ok(driver)
    }
}

impl<T: Transport> Session for GenericDriver<T> {
    async fn elevate(&mut self) -> Result<()> {
        let target = self.platform().default_privilege.clone();
        self.acquire_privilege(&target).await
    }

    async fn execute(&mut self, command: &str) -> Result<String> {
        let response = self.send_command(command).await?;
        debug!("{}: {:?} answered in {:?}", self.host(), command, response.elapsed);
        if let Some(ref marker) = response.failure_message {
            warn!("{}: {:?} rejected: {}", self.host(), command, marker);
        }
        Ok(response.result)
    }

    async fn close(mut self) -> Result<()> {
        GenericDriver::<T>::close(&mut self).await
    }
}
