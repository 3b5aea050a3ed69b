//! Configuration file handling for bundle-harness
//!
//! This module contains data structures for:
//! - `harness.yaml` - Resolver, export convention and runtime limits

mod harness;

pub use harness::HarnessConfig;
