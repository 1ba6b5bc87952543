//! Classification of raw lookup strings into typed keys.
//!
//! Routes accept one opaque path segment for all single-user operations;
//! the segment is classified here rather than at each call site so every
//! operation resolves users by the same rules.

use std::fmt;

/// A typed key for resolving a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    /// Numeric primary key.
    Id(i64),
    /// Username, normalized to lowercase before matching.
    Username(String),
    /// Email address, matched verbatim.
    Email(String),
}

impl LookupKey {
    /// Classify a raw key.
    ///
    /// A string of nothing but ASCII digits is an id, anything containing
    /// an `@` is an email, and everything else is a username (lowercased,
    /// since usernames are stored lowercase).
    pub fn classify(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = raw.parse::<i64>() {
                return LookupKey::Id(id);
            }
            // Digit strings past i64 range cannot match a stored id; let
            // them miss as usernames instead of failing the request.
        }
        if raw.contains('@') {
            LookupKey::Email(raw.to_string())
        } else {
            LookupKey::Username(raw.to_lowercase())
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Id(id) => write!(f, "id {id}"),
            LookupKey::Username(name) => write!(f, "username {name}"),
            LookupKey::Email(email) => write!(f, "email {email}"),
        }
    }
}
