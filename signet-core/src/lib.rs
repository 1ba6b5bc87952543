//! # Signet Core
//!
//! Core library for the Signet account service: user records and their
//! validation rules, the storage port with its Postgres implementation,
//! and the shared health state the server gates requests on.
//!
//! ## Architecture
//!
//! - [`user`]: account records and the payloads that create and modify them
//! - [`lookup`]: classification of raw lookup keys into id / username / email
//! - [`blocklist`]: the screened-names list applied by availability checks
//! - [`directory`]: high-level account operations, generic over the storage port
//! - [`repo`]: the storage port and its Postgres implementation
//! - [`health`]: shared connectivity state for the backing store
//! - [`error`]: the error taxonomy callers map onto transport status codes
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use signet_core::UserDirectory;
//! use signet_core::repo::postgres::PostgresUsersRepository;
//!
//! async fn lookup() -> signet_core::Result<()> {
//!     let repo = PostgresUsersRepository::connect_lazy(
//!         "postgres://localhost/signet",
//!         5,
//!         Duration::from_secs(3),
//!     )?;
//!     let directory = UserDirectory::new(Arc::new(repo));
//!     let user = directory.get_user("kate").await?;
//!     println!("{user:?}");
//!     Ok(())
//! }
//! ```

/// Screened usernames applied by the availability check
pub mod blocklist;
/// High-level account operations over the storage port
pub mod directory;
/// Error types and the shared result alias
pub mod error;
/// Shared store-connectivity state
pub mod health;
/// Classification of raw lookup keys
pub mod lookup;
/// Storage port and its implementations
pub mod repo;
/// User records, creation payloads and validation
pub mod user;

/// Embedded schema migrations, applied by the server at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use directory::{UserDirectory, UsernameAvailability};
pub use error::{DirectoryError, Result};
pub use health::{Health, HealthSnapshot};
pub use lookup::LookupKey;
pub use repo::UsersRepository;
pub use user::{CreateUser, MigratedUser, NewUser, User, UserDraft, UserPatch};
