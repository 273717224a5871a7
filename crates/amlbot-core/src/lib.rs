//! Core domain + application logic for the AML checker bot.
//!
//! This crate is intentionally framework-agnostic. Telegram, the AML HTTP API and the
//! status endpoint live behind ports (traits) or in adapter crates.

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod i18n;
pub mod logging;
pub mod messaging;
pub mod metrics;
pub mod ports;
pub mod service;

pub use errors::{Error, Result};
