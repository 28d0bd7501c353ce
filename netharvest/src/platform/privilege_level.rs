//! Privilege level definition.

use regex::bytes::Regex;

/// A privilege level on a network device.
///
/// Levels form a tree through `previous_priv`; a level is reached from its
/// parent with `escalate_command`, optionally answering a password prompt.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this level (e.g. "exec", "privilege_exec").
    pub name: String,

    /// Regex matching the prompt at this level.
    pub pattern: Regex,

    /// Parent level, `None` for the root.
    pub previous_priv: Option<String>,

    /// Command that enters this level from the parent.
    pub escalate_command: Option<String>,

    /// Password prompt shown while escalating, if the level is protected.
    pub escalate_prompt: Option<Regex>,

    /// Substrings that rule this level out even when `pattern` matches.
    /// `#` ends both privileged and configuration prompts, for instance.
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            previous_priv: None,
            escalate_command: None,
            escalate_prompt: None,
            not_contains: vec![],
        })
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.previous_priv = Some(parent.into());
        self
    }

    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    /// Require a password when escalating into this level.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Whether escalating into this level asks for a password.
    pub fn needs_auth(&self) -> bool {
        self.escalate_prompt.is_some()
    }

    /// Check if this privilege level matches a prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        !self.not_contains.iter().any(|nc| prompt.contains(nc))
            && self.pattern.is_match(prompt.as_bytes())
    }
}
