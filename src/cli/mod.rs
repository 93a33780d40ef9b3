//! Command-line interface for policydesk.

mod commands;
mod icons;
pub mod session;

pub use commands::{is_verbose, run};
