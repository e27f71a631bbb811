//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - External command execution primitives
//! - `shell` - Shell escaping and quoting

pub mod command;
pub mod shell;
