//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Every command loads its flow
//! definition the same way and writes its report to the writer it is given.

pub mod dispatcher;
pub mod inspect;
pub mod order;
pub mod serialize;
pub mod validate;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
