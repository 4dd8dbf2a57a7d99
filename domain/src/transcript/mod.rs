//! Transcript subdomain: bounded per-session turn history.

pub mod entities;
pub mod session_key;
