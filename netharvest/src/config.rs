//! Run configuration from the environment.
//!
//! The command line carries only the template path. Everything else has a
//! default that an environment variable can override:
//!
//! | Variable               | Default                                  |
//! |------------------------|------------------------------------------|
//! | `NETHARVEST_OUTPUT`    | `<template-dir>/<template-stem>-results.xlsx` |
//! | `NETHARVEST_TIMEOUT`   | `30` (seconds)                           |
//! | `NETHARVEST_PORT`      | `22`                                     |
//! | `NETHARVEST_HOST_KEYS` | `accept-new`                             |
//! | `NETHARVEST_LOG`       | `output.log`                             |

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::driver::DEFAULT_TIMEOUT;
use crate::error::ConfigError;
use crate::inventory::Template;
use crate::transport::HostKeyVerification;

pub const OUTPUT_VAR: &str = "NETHARVEST_OUTPUT";
pub const TIMEOUT_VAR: &str = "NETHARVEST_TIMEOUT";
pub const PORT_VAR: &str = "NETHARVEST_PORT";
pub const HOST_KEYS_VAR: &str = "NETHARVEST_HOST_KEYS";
pub const LOG_VAR: &str = "NETHARVEST_LOG";

pub const DEFAULT_LOG_FILE: &str = "output.log";
pub const DEFAULT_PORT: u16 = 22;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub template: PathBuf,
    pub output: PathBuf,
    pub log_file: PathBuf,
    pub timeout: Duration,
    pub port: u16,
    pub host_key_verification: HostKeyVerification,
}

impl RunConfig {
    pub fn from_env(template: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::from_lookup(template, |var| env::var(var).ok())
    }

    /// Build the configuration, reading overrides through `lookup`. Blank
    /// values count as unset.
    pub fn from_lookup(
        template: impl Into<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let template = template.into();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let output = get(OUTPUT_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_output_path(&template));
        let log_file = get(LOG_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        let timeout = match get(TIMEOUT_VAR) {
            Some(value) => {
                let secs: u64 = parse(TIMEOUT_VAR, &value)?;
                if secs == 0 {
                    return Err(invalid(TIMEOUT_VAR, &value, "must be at least 1 second"));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        let port = match get(PORT_VAR) {
            Some(value) => match parse(PORT_VAR, &value)? {
                0 => return Err(invalid(PORT_VAR, &value, "port 0 is not connectable")),
                port => port,
            },
            None => DEFAULT_PORT,
        };

        let host_key_verification = match get(HOST_KEYS_VAR) {
            Some(value) => parse(HOST_KEYS_VAR, &value)?,
            None => HostKeyVerification::default(),
        };

        Ok(Self {
            template,
            output,
            log_file,
            timeout,
            port,
            host_key_verification,
        })
    }

    /// Apply the per-device settings to every roster entry.
    pub fn apply(&self, template: &mut Template) {
        for target in &mut template.roster {
            target.port = self.port;
            target.timeout = self.timeout;
        }
    }
}

/// `<dir>/<stem>-results.xlsx` beside the template.
pub fn default_output_path(template: &Path) -> PathBuf {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "netharvest".to_string());
    template.with_file_name(format!("{stem}-results.xlsx"))
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(var, value, &e.to_string()))
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
