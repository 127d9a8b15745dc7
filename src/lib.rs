//! Folio application library
//!
//! Application modules and the bootstrap shared by the `folio-app` binary and
//! the CLI.

pub mod app;
pub mod modules;
pub mod utils;
