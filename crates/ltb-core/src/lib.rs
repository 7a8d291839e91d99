//! Core domain + application logic for the Lark task bot.
//!
//! This crate is platform-agnostic. The Lark HTTP API and the webhook event
//! source live behind ports (traits) implemented in the adapter crate.

pub mod command;
pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod orchestrator;
pub mod router;
pub mod task;

pub use errors::{Error, Result};
