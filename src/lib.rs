//! tfau - Terraform module, provider and required_version updater library
//!
//! This library provides the core functionality for upgrading version
//! constraints in Terraform configuration:
//! - Module sources from the Terraform Registry and git forges
//! - Providers declared in `required_providers` or `provider` blocks
//! - The `terraform { required_version }` constraint
//!
//! Files are edited in place; only the version literals change.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod update;
