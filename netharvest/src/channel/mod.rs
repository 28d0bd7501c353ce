//! Channel layer for prompt detection on interactive sessions.
//!
//! Output read from the PTY is accumulated in a [`PatternBuffer`] with ANSI
//! escapes removed, and prompts are searched for only near its tail.

mod buffer;

pub use buffer::PatternBuffer;
