//! Student Records Library
//!
//! Course/semester student lookups served over REST and a WebSocket event
//! channel, with a shared validation core and response envelope.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;
pub mod students;

pub use config::Config;
pub use error::{Error, QueryError, Result};
