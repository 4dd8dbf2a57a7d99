//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelDescriptor`]: a known backend and its metadata
//! - [`registry::ModelRegistry`]: the read-only table of known backends
//! - [`message::UserMessage`]: a validated user message
//! - [`error::DomainError`]: precondition errors

pub mod error;
pub mod message;
pub mod model;
pub mod registry;
pub mod string;
