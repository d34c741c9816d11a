#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for polyres.
//!
//! Pure helpers with no logging/tracing dependencies. Logging is handled
//! by the CLI crate and the resolver core.

pub mod fs;
pub mod hash;
