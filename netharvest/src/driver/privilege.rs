//! Privilege level tracking and escalation paths.

use indexmap::IndexMap;

use crate::error::{DriverError, Result};
use crate::platform::PrivilegeLevel;

/// Tracks the current privilege level and plans escalations.
///
/// Levels form a tree through `previous_priv`. Escalation always walks
/// from a level down to one of its descendants, one `escalate_command`
/// per hop.
#[derive(Debug)]
pub struct PrivilegeManager {
    levels: IndexMap<String, PrivilegeLevel>,
    current: Option<String>,
}

impl PrivilegeManager {
    /// Create a manager positioned at the root level.
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        let current = levels
            .values()
            .find(|l| l.previous_priv.is_none())
            .map(|l| l.name.clone());

        Self { levels, current }
    }

    /// Determine the privilege level a prompt belongs to.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel> {
        self.levels
            .values()
            .find(|level| level.matches(prompt))
            .ok_or_else(|| {
                DriverError::UnknownPrivilege {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    pub fn current(&self) -> Option<&PrivilegeLevel> {
        self.current.as_ref().and_then(|name| self.levels.get(name))
    }

    /// Update the current level from a prompt, leaving it unchanged when
    /// the prompt is not recognised. Returns the recognised level name.
    pub fn observe_prompt(&mut self, prompt: &str) -> Option<String> {
        let name = self.determine_from_prompt(prompt).ok()?.name.clone();
        self.current = Some(name.clone());
        Some(name)
    }

    pub fn get(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.levels.get(name)
    }

    /// Levels to enter, in order, to get from `from` to `to`.
    ///
    /// `from` itself is not included; an empty path means already there.
    /// Fails when `to` is not a descendant of `from`.
    pub fn escalation_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let no_path = || DriverError::NoPrivilegePath {
            from: from.to_string(),
            to: to.to_string(),
        };

        let mut path = Vec::new();
        let mut node = to;

        while node != from {
            let level = self.levels.get(node).ok_or_else(no_path)?;
            path.push(node.to_string());
            node = level.previous_priv.as_deref().ok_or_else(no_path)?;
        }

        path.reverse();
        Ok(path)
    }
}
