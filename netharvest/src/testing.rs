//! Scripted devices, shells and prompts for exercising the collector
//! without a network or a terminal.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use regex::bytes::Regex;
use secrecy::SecretString;

use crate::channel::PatternBuffer;
use crate::credentials::{Credentials, SecretPrompt};
use crate::driver::GenericDriver;
use crate::error::{ChannelError, DriverError, Error, FailureKind, Result, TransportError};
use crate::inventory::DeviceTarget;
use crate::platform;
use crate::session::{Session, SessionConnector};
use crate::transport::{HostKeyVerification, SshConfig, Transport};

static SIGNAL_LOCK: Mutex<()> = Mutex::new(());

/// Serialises tests that listen for or raise SIGINT.
pub fn signal_lock() -> MutexGuard<'static, ()> {
    SIGNAL_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// A password prompt with a fixed answer.
pub struct ScriptedPrompt(io::Result<String>);

impl ScriptedPrompt {
    pub fn answering(secret: &str) -> Self {
        Self(Ok(secret.to_string()))
    }

    pub fn failing(kind: io::ErrorKind) -> Self {
        Self(Err(io::Error::new(kind, "scripted")))
    }
}

impl SecretPrompt for ScriptedPrompt {
    fn read_secret(&self, _prompt: &str) -> io::Result<String> {
        match &self.0 {
            Ok(secret) => Ok(secret.clone()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

/// A shell that replays canned output. Each line sent must match the next
/// expected input, and its reply becomes readable.
#[derive(Debug)]
pub struct ScriptedTransport {
    buffer: PatternBuffer,
    exchanges: VecDeque<(String, String)>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    /// `banner` is readable before anything is sent.
    pub fn new(banner: &str) -> Self {
        let mut buffer = PatternBuffer::default();
        buffer.extend(banner.as_bytes());
        Self {
            buffer,
            exchanges: VecDeque::new(),
            sent: Arc::default(),
        }
    }

    pub fn expect(mut self, input: &str, reply: &str) -> Self {
        self.exchanges.push_back((input.to_string(), reply.to_string()));
        self
    }

    /// Terminal preparation that the cisco_ios platform runs on open.
    pub fn with_terminal_setup(self, prompt: &str) -> Self {
        self.expect("terminal length 0", &format!("terminal length 0\n{prompt}"))
            .expect("terminal width 511", &format!("terminal width 511\n{prompt}"))
    }

    /// Handle on every line sent so far.
    pub fn sent(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sent)
    }
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, input: &str) -> Result<()> {
        self.sent.lock().unwrap().push(input.to_string());
        match self.exchanges.pop_front() {
            Some((expected, reply)) if expected == input => {
                self.buffer.extend(reply.as_bytes());
                Ok(())
            }
            _ => Err(ChannelError::Closed.into()),
        }
    }

    async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        self.buffer
            .take_through(pattern)
            .ok_or_else(|| ChannelError::PatternTimeout(timeout).into())
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

/// A cisco_ios driver over a scripted shell, already past the first prompt.
pub async fn scripted_driver(transport: ScriptedTransport) -> Result<GenericDriver<ScriptedTransport>> {
    let ssh_config = SshConfig {
        host: "r1".to_string(),
        port: 22,
        username: "netops".to_string(),
        password: SecretString::from("s3cret"),
        timeout: Duration::from_secs(1),
        terminal_width: 511,
        terminal_height: 24,
        host_key_verification: HostKeyVerification::Disabled,
        known_hosts_path: None,
    };
    let platform = platform::by_name(platform::CISCO_IOS)?;
    let mut driver = GenericDriver::new(ssh_config, None, platform)?;
    driver.start(transport).await?;
    Ok(driver)
}

type Journal = Arc<Mutex<HashMap<String, Vec<String>>>>;

/// Behaviour of one scripted device.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    responses: HashMap<String, String>,
    connect_failure: Option<FailureKind>,
    reject_enable: bool,
    fail_close: bool,
}

impl MockDevice {
    /// A reachable device answering each listed command. Any other command
    /// ends the session with a channel error.
    pub fn responding(responses: &[(&str, &str)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(c, o)| (c.to_string(), o.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// A device that fails while connecting.
    pub fn unreachable(kind: FailureKind) -> Self {
        Self {
            connect_failure: Some(kind),
            ..Self::default()
        }
    }

    pub fn rejecting_enable(mut self) -> Self {
        self.reject_enable = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

fn error_of(kind: FailureKind, user: &str) -> Error {
    match kind {
        FailureKind::ConnectionTimeout => TransportError::Timeout(Duration::from_secs(30)).into(),
        FailureKind::AuthenticationFailure => TransportError::AuthenticationFailed {
            user: user.to_string(),
        }
        .into(),
        FailureKind::SessionError => ChannelError::Closed.into(),
    }
}

/// Connector over a fixed set of scripted devices. Hosts it does not know
/// time out.
#[derive(Debug, Default)]
pub struct MockConnector {
    devices: HashMap<String, MockDevice>,
    journal: Journal,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, host: &str, device: MockDevice) -> Self {
        self.devices.insert(host.to_string(), device);
        self
    }

    /// Number of connection attempts made so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Operations performed on sessions to `host`, in order.
    pub fn log(&self, host: &str) -> Vec<String> {
        self.journal
            .lock()
            .unwrap()
            .get(host)
            .cloned()
            .unwrap_or_default()
    }
}

impl SessionConnector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, target: &DeviceTarget, credentials: &Credentials) -> Result<MockSession> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let device = match self.devices.get(&target.host) {
            Some(device) => device.clone(),
            None => return Err(error_of(FailureKind::ConnectionTimeout, &credentials.username)),
        };
        if let Some(kind) = device.connect_failure {
            return Err(error_of(kind, &credentials.username));
        }

        Ok(MockSession {
            host: target.host.clone(),
            device,
            journal: Arc::clone(&self.journal),
        })
    }
}

#[derive(Debug)]
pub struct MockSession {
    host: String,
    device: MockDevice,
    journal: Journal,
}

impl MockSession {
    fn record(&self, entry: String) {
        self.journal
            .lock()
            .unwrap()
            .entry(self.host.clone())
            .or_default()
            .push(entry);
    }
}

impl Session for MockSession {
    async fn elevate(&mut self) -> Result<()> {
        self.record("elevate".to_string());
        if self.device.reject_enable {
            return Err(DriverError::PrivilegeAcquisitionFailed {
                target: "privilege_exec".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<String> {
        self.record(format!("execute {command}"));
        self.device
            .responses
            .get(command)
            .cloned()
            .ok_or_else(|| ChannelError::Closed.into())
    }

    async fn close(self) -> Result<()> {
        self.record("close".to_string());
        if self.device.fail_close {
            return Err(ChannelError::Closed.into());
        }
        Ok(())
    }
}
