//! Parley core: domain models, persistence, and the durable-state services
//! behind the conferencing server (admission state machine, reminders, auth,
//! TURN credentials, rate limiting).

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod service;

pub use config::Config;
pub use error::{Error, Result};
