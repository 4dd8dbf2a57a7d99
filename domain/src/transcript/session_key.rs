//! Session keys and the storage policy they imply

use serde::{Deserialize, Serialize};

/// Which backing policy a session's transcript lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorePolicy {
    /// Durable storage keyed by an authenticated identity
    Durable,
    /// Ephemeral storage keyed by the local device
    Ephemeral,
}

/// Identity a transcript is stored under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum SessionKey {
    /// Authenticated user identity
    Identity(String),
    /// Unauthenticated, device-local session
    Device(String),
}

impl SessionKey {
    pub fn identity(id: impl Into<String>) -> Self {
        SessionKey::Identity(id.into())
    }

    pub fn device(id: impl Into<String>) -> Self {
        SessionKey::Device(id.into())
    }

    /// Policy the caller should pick for this key
    pub fn policy(&self) -> StorePolicy {
        match self {
            SessionKey::Identity(_) => StorePolicy::Durable,
            SessionKey::Device(_) => StorePolicy::Ephemeral,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SessionKey::Identity(id) | SessionKey::Device(id) => id,
        }
    }

    /// Filesystem-safe storage name, e.g. `users_alice` or `devices_laptop`.
    ///
    /// Distinct keys always get distinct names, also on case-insensitive
    /// filesystems: lowercase ASCII letters, digits and `-` are kept, every
    /// other byte is written as `_` plus two lowercase hex digits.
    pub fn storage_name(&self) -> String {
        let prefix = match self {
            SessionKey::Identity(_) => "users",
            SessionKey::Device(_) => "devices",
        };
        let mut name = format!("{}_", prefix);
        for byte in self.id().bytes() {
            match byte {
                b'a'..=b'z' | b'0'..=b'9' | b'-' => name.push(byte as char),
                _ => name.push_str(&format!("_{:02x}", byte)),
            }
        }
        name
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKey::Identity(id) => write!(f, "user:{}", id),
            SessionKey::Device(id) => write!(f, "device:{}", id),
        }
    }
}
