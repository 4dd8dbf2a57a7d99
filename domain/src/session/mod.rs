//! Session domain.
//!
//! - [`context::SessionContext`]: selection and temperatures of one session
//! - [`context::DispatchSnapshot`]: the frozen copy a dispatch works from

pub mod context;
