//! A line-oriented command interpreter for a small bookstore.
//!
//! The crate keeps three kinds of records (staff and customer accounts, the
//! book catalogue and an append-only sales ledger) and exposes them through
//! privilege-gated commands such as `su`, `select`, `modify`, `buy` and
//! `report finance`. Every command either applies completely or is rejected
//! with the single marker line `Invalid`.
//!
//! The main entry point is [`Interpreter`], which owns an [`Environment`]
//! (records, login stack and the book open for editing) and dispatches each
//! input line to a set of pluggable command factories. [`persist`] loads the
//! records at start-up and dumps them again at shutdown.

mod account;
mod builtin;
mod catalog;
pub mod command;
pub mod config;
pub mod env;
mod interpreter;
pub mod money;
mod parser;
pub mod persist;
mod report;
pub mod session;
pub mod store;

pub use env::Environment;
/// Just a convenient re-export of the command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{Interpreter, Step};
