//! Core domain models for tfau
//!
//! This module contains the fundamental types used throughout the application:
//! - Declaration kinds and declarations extracted from `.tf` files
//! - Source address classification
//! - Update decision results
//! - Summary and result structures

mod declaration;
mod kind;
mod source;
mod summary;
mod update_result;

pub use declaration::{Declaration, DeclarationKey, ProviderRequirement, DEFAULT_PROVIDER_NAMESPACE};
pub use kind::DeclarationKind;
pub use source::{
    classify_source, normalize_scp_like, split_ref_marker, ClassifiedSource, ProviderAddress,
    RegistryModuleAddress, RemoteLocation, SourceKind,
};
pub use summary::{FileUpdateResult, UpdateSummary};
pub use update_result::{SkipReason, UpdateResult};
