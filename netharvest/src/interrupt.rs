//! Ctrl-C handling for the binary.
//!
//! Once any tokio signal listener exists, SIGINT no longer terminates the
//! process by default. The binary therefore installs a watcher that exits
//! explicitly, with terminal echo restored in case the password prompt had
//! turned it off.

use std::io::{self, IsTerminal};
use std::process::{Command, Stdio};

use log::debug;
use tokio::task::JoinHandle;

/// Exit status when the operator interrupts the run.
pub const CANCELLED_STATUS: i32 = 130;

/// Run `action` on the next Ctrl-C.
///
/// The listener is registered before this returns, so an interrupt raised
/// right after the call is not missed.
pub fn on_interrupt<F>(action: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupts = signal(SignalKind::interrupt())?;
        Ok(tokio::spawn(async move {
            if interrupts.recv().await.is_some() {
                action();
            }
        }))
    }

    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                action();
            }
        }))
    }
}

/// Turn terminal echo back on. Returns whether the terminal was touched.
pub fn restore_echo() -> bool {
    restore_echo_on(io::stdin().is_terminal())
}

fn restore_echo_on(terminal: bool) -> bool {
    if !terminal || !cfg!(unix) {
        return false;
    }
    match Command::new("stty").arg("echo").stdin(Stdio::inherit()).status() {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("cannot restore terminal echo: {e}");
            false
        }
    }
}

/// Restore the terminal and exit with [`CANCELLED_STATUS`].
pub fn exit_cancelled() -> ! {
    restore_echo();
    std::process::exit(CANCELLED_STATUS)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::credentials::{CredentialPrompt, obtain_credentials};
    use crate::testing::{ScriptedPrompt, signal_lock};

    #[cfg(unix)]
    #[tokio::test]
    async fn test_interrupt_after_prompt_reaches_watcher() {
        let _guard = signal_lock();

        let outcome = obtain_credentials(ScriptedPrompt::answering("pw"), "netops".into())
            .await
            .unwrap();
        assert!(matches!(outcome, CredentialPrompt::Provided(_)));

        let (tx, rx) = tokio::sync::oneshot::channel();
        let watcher = on_interrupt(move || {
            let _ = tx.send(());
        })
        .unwrap();

        let status = Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("Ctrl-C during the batch was swallowed")
            .unwrap();
        watcher.await.unwrap();
    }

    #[test]
    fn test_echo_left_alone_without_terminal() {
        assert!(!restore_echo_on(false));
    }
}
