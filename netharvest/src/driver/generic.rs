//! Generic driver implementation that works with any platform.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::privilege::PrivilegeManager;
use super::response::Response;
use crate::error::{DriverError, PlatformError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport, Transport};

/// Driver for one device, parameterised by its platform definition.
///
/// Handles:
/// - SSH transport management
/// - Command execution with prompt detection
/// - Privilege escalation (`enable`)
pub struct GenericDriver<T = SshTransport> {
    ssh_config: SshConfig,

    /// Secret for escalation prompts; the login password when `None`.
    enable_secret: Option<SecretString>,

    platform: PlatformDefinition,

    /// Shell transport (None when disconnected).
    transport: Option<T>,

    privilege_manager: PrivilegeManager,

    /// Per-read timeout.
    timeout: Duration,

    /// Matches the prompt of any privilege level.
    prompt_pattern: Regex,
}

impl<T: Transport> GenericDriver<T> {
    pub fn new(
        ssh_config: SshConfig,
        enable_secret: Option<SecretString>,
        platform: PlatformDefinition,
    ) -> Result<Self> {
        let prompt_pattern = platform
            .prompt_pattern()
            .map_err(PlatformError::InvalidPattern)?;
        let privilege_manager = PrivilegeManager::new(platform.privilege_levels.clone());

        Ok(Self {
            timeout: ssh_config.timeout,
            ssh_config,
            enable_secret,
            platform,
            transport: None,
            privilege_manager,
            prompt_pattern,
        })
    }

    pub fn host(&self) -> &str {
        &self.ssh_config.host
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Name of the current privilege level.
    pub fn current_privilege(&self) -> Option<&str> {
        self.privilege_manager.current().map(|l| l.name.as_str())
    }

    fn transport(&mut self) -> Result<&mut T> {
        Ok(self.transport.as_mut().ok_or(DriverError::NotConnected)?)
    }

    fn enable_secret(&self) -> &SecretString {
        self.enable_secret
            .as_ref()
            .unwrap_or(&self.ssh_config.password)
    }

    /// Read until `pattern` matches; returns the raw text and its last line.
    async fn read_until(&mut self, pattern: &Regex) -> Result<(String, String)> {
        let timeout = self.timeout;
        let data = self.transport()?.read_until_pattern(pattern, timeout).await?;
        let raw = String::from_utf8_lossy(&data).into_owned();
        let prompt = last_line(&raw).to_string();
        trace!("read {} bytes ending in {:?}", raw.len(), prompt);
        Ok((raw, prompt))
    }

    /// Take over an established shell: wait for the first prompt and
    /// prepare the terminal.
    pub async fn start(&mut self, transport: T) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }
        self.transport = Some(transport);

        let prompt_pattern = self.prompt_pattern.clone();
        let (_, prompt) = self.read_until(&prompt_pattern).await?;
        let level = self.privilege_manager.observe_prompt(&prompt);
        debug!(
            "{}: initial prompt {:?} ({})",
            self.ssh_config.host,
            prompt,
            level.as_deref().unwrap_or("unknown level")
        );

        for command in self.platform.on_open_commands.clone() {
            self.send_command(&command).await?;
        }

        Ok(())
    }

    /// Send a command and wait for the prompt.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let start = Instant::now();

        self.transport()?.send(command).await?;
        let prompt_pattern = self.prompt_pattern.clone();
        let (raw, prompt) = self.read_until(&prompt_pattern).await?;

        self.privilege_manager.observe_prompt(&prompt);

        let result = self.platform.normalize_output(&raw, command);
        let response = Response::new(command, result, start.elapsed());

        match self.platform.detect_failure(&response.result) {
            Some(marker) => {
                let marker = marker.to_string();
                Ok(response.with_failure(marker))
            }
            None => Ok(response),
        }
    }

    /// Escalate to `target`, answering password prompts with the enable secret.
    pub async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        let current = self
            .current_privilege()
            .map(str::to_string)
            .unwrap_or_default();

        let path = self.privilege_manager.escalation_path(&current, target)?;

        for name in path {
            let failed = || DriverError::PrivilegeAcquisitionFailed {
                target: name.clone(),
            };

            let level = self
                .privilege_manager
                .get(&name)
                .ok_or_else(failed)?
                .clone();
            let command = level.escalate_command.as_deref().ok_or_else(failed)?;

            debug!("{}: escalating to {} with {:?}", self.ssh_config.host, name, command);
            self.transport()?.send(command).await?;

            let prompt = match level.escalate_prompt {
                Some(ref auth) => self.answer_auth_prompt(&name, auth).await?,
                None => {
                    let prompt_pattern = self.prompt_pattern.clone();
                    self.read_until(&prompt_pattern).await?.1
                }
            };

            match self.privilege_manager.observe_prompt(&prompt) {
                Some(reached) if reached == name => {}
                reached => {
                    warn!(
                        "{}: escalation to {} ended at {:?}",
                        self.ssh_config.host, name, reached
                    );
                    return Err(failed().into());
                }
            }
        }

        Ok(())
    }

    /// Wait for either the password prompt or a device prompt; answer the
    /// former once. Returns the prompt the exchange ended on.
    ///
    /// A second password prompt means the secret was rejected.
    async fn answer_auth_prompt(&mut self, target: &str, auth: &Regex) -> Result<String> {
        let either = Regex::new(&format!(
            "(?:{})|(?:{})",
            auth.as_str(),
            self.prompt_pattern.as_str()
        ))
        .map_err(PlatformError::InvalidPattern)?;

        let (_, prompt) = self.read_until(&either).await?;
        if !auth.is_match(prompt.as_bytes()) {
            return Ok(prompt);
        }

        let secret = self.enable_secret().expose_secret().to_string();
        self.transport()?.send(&secret).await?;

        let (_, prompt) = self.read_until(&either).await?;
        if auth.is_match(prompt.as_bytes()) {
            return Err(DriverError::PrivilegeAcquisitionFailed {
                target: target.to_string(),
            }
            .into());
        }
        Ok(prompt)
    }

    /// Disconnect. A no-op when not connected.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(transport) = self.transport.take() {
            debug!("{}: disconnecting", self.ssh_config.host);
            transport.close().await?;
        }
        Ok(())
    }
}

impl GenericDriver<SshTransport> {
    /// Connect over SSH, wait for the first prompt and prepare the terminal.
    pub async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }
        let transport = SshTransport::connect(&self.ssh_config).await?;
        self.start(transport).await
    }
}

/// Last line of `text`, without surrounding whitespace.
fn last_line(text: &str) -> &str {
    text.rsplit('\n').next().unwrap_or_default().trim()
}
