//! Storage port for user records.

pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::lookup::LookupKey;
use crate::user::{User, UserDraft};

/// Storage operations the directory needs.
///
/// The crate ships a Postgres implementation; tests substitute an
/// in-memory one behind the same trait object.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a validated draft, returning the stored record.
    ///
    /// Unique-index collisions on username or email surface as
    /// [`crate::DirectoryError::Validation`].
    async fn insert_user(&self, draft: &UserDraft) -> Result<User>;

    /// Resolve a single user by classified key.
    async fn find_user(&self, key: &LookupKey) -> Result<Option<User>>;

    /// Write back a modified record, returning the stored row.
    async fn update_user(&self, user: &User) -> Result<User>;

    /// Remove a user by id.
    async fn delete_user(&self, id: i64) -> Result<()>;

    /// Number of records holding the (lowercased) username.
    async fn count_username(&self, username: &str) -> Result<i64>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<()>;
}
