//! Command implementations for the bundle-harness CLI

pub mod check;
pub mod completions;
pub mod helpers;
pub mod run;
pub mod version;
