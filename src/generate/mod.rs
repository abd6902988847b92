//! Import-block generation for existing Grafana resources.
//!
//! A run enumerates every resource of every selected type, writes one
//! Terraform `import` block per resource, lets Terraform generate matching
//! configuration and sorts what it wrote so that re-running against an
//! unchanged instance produces identical files.
//!
//! Data flows catalog → filter → enumerate → synthesize → materialize, with
//! the orchestrator driving one pass per environment.

pub mod blocks;
pub mod catalog;
pub mod convert;
pub mod enumerate;
pub mod error;
pub mod filter;
pub mod materialize;
pub mod orchestrator;
pub mod provider;
pub mod synthesize;

#[cfg(test)]
pub mod testing;

pub use orchestrator::{RunSummary, run};
