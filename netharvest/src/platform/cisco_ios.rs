//! Cisco IOS / IOS-XE platform definition.
//!
//! Privilege levels:
//! - `exec` - user EXEC mode with `>` prompt
//! - `privilege_exec` - privileged EXEC mode with `#` prompt, entered with
//!   `enable` and the enable secret
//! - `configuration` - configuration mode with `(config*)#` prompt
//!
//! ```text
//! router>                  # exec
//! router#                  # privilege_exec
//! router(config-if)#       # configuration
//! ```

use super::{PlatformDefinition, PrivilegeLevel};
use crate::error::PlatformError;

/// Device-family tag for Cisco IOS.
pub const CISCO_IOS: &str = "cisco_ios";

/// Create the Cisco IOS platform definition.
pub fn platform() -> Result<PlatformDefinition, PlatformError> {
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@/:]{1,63}>\s?$")?;

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@/:]{1,63}#\s?$")?
        .with_parent("exec")
        .with_escalate("enable")
        .with_auth(r"(?mi)^(?:enable\s)?password:\s?$")?
        .with_not_contains("(conf");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,63}\)#\s?$",
    )?
    .with_parent("privilege_exec")
    .with_escalate("configure terminal");

    Ok(PlatformDefinition::new(CISCO_IOS)
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24))
}
