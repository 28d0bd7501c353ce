//! Error types for netharvest.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netharvest operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Template workbook errors
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Credential capture errors
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Run configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Result workbook errors
    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

impl Error {
    /// Classify a per-device error for failure reporting.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Transport(TransportError::Timeout(_))
            | Error::Transport(TransportError::ConnectionFailed { .. }) => {
                FailureKind::ConnectionTimeout
            }
            Error::Transport(TransportError::AuthenticationFailed { .. })
            | Error::Driver(DriverError::PrivilegeAcquisitionFailed { .. }) => {
                FailureKind::AuthenticationFailure
            }
            _ => FailureKind::SessionError,
        }
    }
}

/// Category of a per-device failure.
///
/// None of these abort a batch; they are recorded against the device and
/// the run moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The transport could not be established within the device timeout.
    ConnectionTimeout,

    /// Login or privilege elevation was rejected.
    AuthenticationFailure,

    /// Anything that went wrong after the session was up.
    SessionError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ConnectionTimeout => "ConnectionTimeout",
            FailureKind::AuthenticationFailure => "AuthenticationFailure",
            FailureKind::SessionError => "SessionError",
        };
        f.write_str(name)
    }
}

/// Template workbook errors. All of them are fatal and abort the run
/// before any device is contacted.
#[derive(Error, Debug)]
pub enum InputError {
    /// The workbook could not be opened
    #[error("Cannot open template '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// A worksheet could not be read
    #[error("Cannot read {sheet} sheet: {source}")]
    Sheet {
        sheet: &'static str,
        #[source]
        source: calamine::Error,
    },

    /// Fewer worksheets than the template layout requires
    #[error("Template has {found} worksheet(s), expected a device sheet and a command sheet")]
    MissingSheet { found: usize },

    /// A required worksheet has no cells at all
    #[error("The {sheet} sheet is empty")]
    EmptySheet { sheet: &'static str },

    /// A device cell between two populated device cells is blank
    #[error("Blank device host in cell {cell}")]
    BlankHost { cell: String },

    /// A command row has command text but no variable name
    #[error("Command in row {row} has no variable name")]
    MissingVariable { row: u32 },
}

/// Credential capture errors.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// No local operator identity could be determined
    #[error("Cannot determine the local username")]
    NoUsername,

    /// The secret prompt failed
    #[error("Password prompt failed: {0}")]
    Prompt(#[source] io::Error),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key differs from the one in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host not present in known_hosts under the strict policy
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Driver layer errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Failed to acquire target privilege level
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Unknown privilege level detected
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },

    /// No path found between privilege levels
    #[error("No path from privilege '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No platform registered under this device-family tag
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// A prompt pattern failed to compile
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Run configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment override could not be parsed
    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// The log file could not be opened
    #[error("Cannot open log file '{}': {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global logger was already installed
    #[error("Logger already initialised: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Result workbook errors.
#[derive(Error, Debug)]
pub enum OutputError {
    /// The spreadsheet writer rejected a cell or the save
    #[error("Cannot write results: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// More variables than a worksheet has columns
    #[error("{0} variables exceed the worksheet column limit")]
    TooManyColumns(usize),
}

/// Result type alias using netharvest's Error.
pub type Result<T> = std::result::Result<T, Error>;
