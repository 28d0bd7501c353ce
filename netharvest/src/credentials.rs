//! Operator credentials for a run.
//!
//! One username and one secret are captured per run and used for every
//! device, both to log in and to answer the `enable` prompt.

use std::env;
use std::io;

use log::debug;
use secrecy::SecretString;

use crate::error::CredentialError;

/// Environment variables consulted, in order, for the operator's identity.
const USERNAME_VARS: [&str; 3] = ["USER", "USERNAME", "LOGNAME"];

/// Login identity and secret. The secret is redacted from `Debug` output.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    secret: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

/// Outcome of asking the operator for credentials.
#[derive(Debug)]
pub enum CredentialPrompt {
    Provided(Credentials),

    /// The operator interrupted the prompt; nothing should be contacted.
    Cancelled,
}

/// Source of the secret.
pub trait SecretPrompt: Send + 'static {
    /// Read a secret without echoing it.
    fn read_secret(&self, prompt: &str) -> io::Result<String>;
}

/// Reads the secret from the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn read_secret(&self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }
}

/// The invoking operator's local username.
pub fn local_username() -> Result<String, CredentialError> {
    username_from(|var| env::var(var).ok())
}

fn username_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String, CredentialError> {
    USERNAME_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .ok_or(CredentialError::NoUsername)
}

/// Ask for the secret for `username`.
///
/// The prompt runs on a blocking thread and races Ctrl-C; either an
/// interrupt or an `Interrupted` read yields [`CredentialPrompt::Cancelled`].
/// An empty secret is returned as-is.
pub async fn obtain_credentials<P: SecretPrompt>(
    prompt: P,
    username: String,
) -> Result<CredentialPrompt, CredentialError> {
    let reader = tokio::task::spawn_blocking(move || prompt.read_secret("Password: "));

    let interrupted = async {
        // Without a signal handler only the prompt itself can cancel.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        joined = reader => {
            let read = joined.map_err(|e| CredentialError::Prompt(io::Error::other(e)))?;
            match read {
                Ok(secret) => {
                    debug!("secret captured for {username}");
                    Ok(CredentialPrompt::Provided(Credentials::new(username, secret)))
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(CredentialPrompt::Cancelled),
                Err(e) => Err(CredentialError::Prompt(e)),
            }
        }
        _ = interrupted => Ok(CredentialPrompt::Cancelled),
    }
}
