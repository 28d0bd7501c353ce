//! High-level driver for device interaction.
//!
//! The driver layer turns an SSH shell into a command/response API:
//! it waits for prompts, strips echoes, and escalates privilege.

mod builder;
mod generic;
mod privilege;
mod response;

pub use builder::{DEFAULT_TIMEOUT, DriverBuilder};
pub use generic::GenericDriver;
pub use privilege::PrivilegeManager;
pub use response::Response;
