//! Prompt domain
//!
//! Templates for the fusion step: the synthesis prompt and the
//! deterministic concatenation fallback.

mod template;

pub use template::{FALLBACK_SEPARATOR, PromptTemplate};
