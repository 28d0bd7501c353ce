//! Log sink setup for the binary.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::error::ConfigError;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Open `path` for appending, creating it when missing.
pub fn open_log_file(path: &Path) -> Result<File, ConfigError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ConfigError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Route every log record to `path`, one `<timestamp> - <message>` line each.
///
/// Call once, at startup.
pub fn init(path: &Path) -> Result<(), ConfigError> {
    let file = open_log_file(path)?;

    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| writeln!(buf, "{} - {}", buf.timestamp(), record.args()))
        .try_init()?;
    Ok(())
}
