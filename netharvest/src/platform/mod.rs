//! Platform definitions for the supported device families.
//!
//! A platform describes prompt patterns, the privilege level graph,
//! terminal preparation and command failure markers for one family.

mod cisco_ios;
mod definition;
mod privilege_level;

pub use cisco_ios::CISCO_IOS;
pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;

use crate::error::PlatformError;

/// Look up the platform definition for a device-family tag.
pub fn by_name(name: &str) -> Result<PlatformDefinition, PlatformError> {
    match name {
        CISCO_IOS => cisco_ios::platform(),
        _ => Err(PlatformError::UnknownPlatform {
            name: name.to_string(),
        }),
    }
}
