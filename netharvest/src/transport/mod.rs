//! SSH transport layer wrapping russh.
//!
//! This module handles connection setup, authentication, the interactive
//! PTY shell, and prompt-delimited reads from it.

pub mod config;
mod ssh;

use std::future::Future;
use std::time::Duration;

use regex::bytes::Regex;

pub use config::{HostKeyVerification, SshConfig};
pub use ssh::SshTransport;

use crate::error::Result;

/// A line-oriented shell the driver talks to.
pub trait Transport: Send {
    /// Send one line of input.
    fn send(&mut self, input: &str) -> impl Future<Output = Result<()>> + Send;

    /// Read until `pattern` matches near the end of the received output and
    /// return everything up to and including the match.
    fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// End the connection.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}
