//! Builder for creating device drivers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::generic::GenericDriver;
use crate::error::{DriverError, Result};
use crate::platform;
use crate::transport::{HostKeyVerification, SshConfig};

/// Default connect and read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for constructing device drivers.
///
/// # Example
///
/// ```rust,no_run
/// use netharvest::driver::DriverBuilder;
///
/// # fn example() -> Result<(), netharvest::Error> {
/// let driver = DriverBuilder::new("192.0.2.10")
///     .username("admin")
///     .password("secret")
///     .platform("cisco_ios")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<SecretString>,
    enable_secret: Option<SecretString>,
    platform_name: Option<String>,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DriverBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            password: None,
            enable_secret: None,
            platform_name: None,
            timeout: DEFAULT_TIMEOUT,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<SecretString>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the secret answered to the `enable` prompt. Defaults to the
    /// login password.
    pub fn enable_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.enable_secret = Some(secret.into());
        self
    }

    /// Set the device-family tag (e.g. "cisco_ios").
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host_key_verification(mut self, policy: HostKeyVerification) -> Self {
        self.host_key_verification = policy;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the driver.
    ///
    /// This does not connect; call [`GenericDriver::open`] on the result.
    pub fn build(self) -> Result<GenericDriver> {
        let invalid = |message: &str| DriverError::InvalidConfig {
            message: message.to_string(),
        };

        if self.host.trim().is_empty() {
            return Err(invalid("host is required").into());
        }
        let username = self.username.ok_or_else(|| invalid("username is required"))?;
        let password = self.password.ok_or_else(|| invalid("password is required"))?;
        let platform_name = self
            .platform_name
            .ok_or_else(|| invalid("platform is required"))?;

        let platform = platform::by_name(&platform_name)?;

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            password,
            timeout: self.timeout,
            terminal_width: platform.terminal_width,
            terminal_height: platform.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        GenericDriver::new(ssh_config, self.enable_secret, platform)
    }
}
