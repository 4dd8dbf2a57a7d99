//! Turn subdomain: branches, failures and the turn entity.
//!
//! A [`Turn`](entities::Turn) owns one [`Branch`](branch::Branch) per
//! selected backend. Branches resolve independently; the turn becomes
//! terminal once every branch and the fusion step have resolved.

pub mod branch;
pub mod entities;
pub mod failure;
pub mod value_objects;
