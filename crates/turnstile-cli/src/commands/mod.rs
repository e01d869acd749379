//! CLI command implementations.

pub mod fanout;
pub mod list;
pub mod tickets;
