//! The user directory: validation and orchestration over the storage port.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::blocklist;
use crate::error::{DirectoryError, Result};
use crate::lookup::LookupKey;
use crate::repo::UsersRepository;
use crate::user::{CreateUser, User, UserPatch};

/// Outcome of a username availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsernameAvailability {
    /// True when at least one record already holds the name.
    pub taken: bool,
}

/// Account operations over an abstract store.
///
/// Generic over the repository so tests can run against an in-memory
/// store while the server hands in `Arc<dyn UsersRepository>`.
pub struct UserDirectory<R>
where
    R: UsersRepository + ?Sized,
{
    repo: Arc<R>,
}

impl<R> Clone for UserDirectory<R>
where
    R: UsersRepository + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R> fmt::Debug for UserDirectory<R>
where
    R: UsersRepository + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDirectory")
            .field("repo", &std::any::type_name::<R>())
            .finish()
    }
}

impl<R> UserDirectory<R>
where
    R: UsersRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Resolve a raw key (id, username or email) to a user.
    ///
    /// A miss is `Ok(None)`, not an error; only the transport decides
    /// whether that becomes a 404.
    pub async fn get_user(&self, raw_key: &str) -> Result<Option<User>> {
        let key = LookupKey::classify(raw_key);
        debug!("looking up user by {key}");
        self.repo.find_user(&key).await
    }

    /// Create an account from either accepted payload shape.
    pub async fn create_user(&self, input: CreateUser) -> Result<User> {
        let draft = input.into_draft();
        draft.validate()?;
        self.repo.insert_user(&draft).await
    }

    /// Patch the user resolved by `raw_key` and persist the result.
    pub async fn update_user(&self, raw_key: &str, patch: UserPatch) -> Result<User> {
        let key = LookupKey::classify(raw_key);
        let mut user = self
            .repo
            .find_user(&key)
            .await?
            .ok_or(DirectoryError::NotFound)?;
        patch.apply(&mut user);
        user.validate()?;
        self.repo.update_user(&user).await
    }

    /// Delete the user resolved by `raw_key`, returning the removed
    /// record.
    pub async fn delete_user(&self, raw_key: &str) -> Result<User> {
        let key = LookupKey::classify(raw_key);
        let user = self
            .repo
            .find_user(&key)
            .await?
            .ok_or(DirectoryError::NotFound)?;
        self.repo.delete_user(user.id).await?;
        Ok(user)
    }

    /// Availability check used by signup flows.
    ///
    /// A taken name reports taken without consulting the screened list;
    /// the screen only applies to names that are still free.
    pub async fn check_username(&self, raw_username: &str) -> Result<UsernameAvailability> {
        let username = raw_username.trim().to_lowercase();
        if username.is_empty() {
            return Err(DirectoryError::Validation(
                "Username must be provided".to_string(),
            ));
        }
        let count = self.repo.count_username(&username).await?;
        if count > 0 {
            return Ok(UsernameAvailability { taken: true });
        }
        if blocklist::is_screened(&username) {
            return Err(DirectoryError::Blacklisted);
        }
        Ok(UsernameAvailability { taken: false })
    }

    /// Probe the store.
    pub async fn ping(&self) -> Result<()> {
        self.repo.ping().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::Utc;
    use tokio::sync::Mutex;

    use super::*;
    use crate::user::{NewUser, UserDraft};

    /// Hash-map stand-in for the Postgres repository, mirroring its
    /// uniqueness and not-found behavior.
    #[derive(Default)]
    struct InMemoryRepo {
        users: Mutex<HashMap<i64, User>>,
        next_id: AtomicI64,
    }

    #[async_trait::async_trait]
    impl UsersRepository for InMemoryRepo {
        async fn insert_user(&self, draft: &UserDraft) -> Result<User> {
            let mut users = self.users.lock().await;
            if users.values().any(|u| u.username == draft.username) {
                return Err(DirectoryError::Validation(
                    "Username is already taken".to_string(),
                ));
            }
            if users.values().any(|u| u.email == draft.email) {
                return Err(DirectoryError::Validation(
                    "Email address is already registered".to_string(),
                ));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let now = Utc::now();
            let user = User {
                id,
                email: draft.email.clone(),
                username: draft.username.clone(),
                full_name: draft.full_name.clone(),
                send_engagements: draft.send_engagements,
                send_notifications: draft.send_notifications,
                is_admin: draft.is_admin,
                is_suspended: draft.is_suspended,
                was_migrated: draft.was_migrated,
                created_at: now,
                updated_at: now,
            };
            users.insert(id, user.clone());
            Ok(user)
        }

        async fn find_user(&self, key: &LookupKey) -> Result<Option<User>> {
            let users = self.users.lock().await;
            let found = match key {
                LookupKey::Id(id) => users.get(id).cloned(),
                LookupKey::Username(name) => {
                    users.values().find(|u| &u.username == name).cloned()
                }
                LookupKey::Email(email) => users.values().find(|u| &u.email == email).cloned(),
            };
            Ok(found)
        }

        async fn update_user(&self, user: &User) -> Result<User> {
            let mut users = self.users.lock().await;
            if !users.contains_key(&user.id) {
                return Err(DirectoryError::NotFound);
            }
            if users
                .values()
                .any(|u| u.id != user.id && u.username == user.username)
            {
                return Err(DirectoryError::Validation(
                    "Username is already taken".to_string(),
                ));
            }
            let mut updated = user.clone();
            updated.updated_at = Utc::now();
            users.insert(updated.id, updated.clone());
            Ok(updated)
        }

        async fn delete_user(&self, id: i64) -> Result<()> {
            let mut users = self.users.lock().await;
            match users.remove(&id) {
                Some(_) => Ok(()),
                None => Err(DirectoryError::NotFound),
            }
        }

        async fn count_username(&self, username: &str) -> Result<i64> {
            let users = self.users.lock().await;
            Ok(users.values().filter(|u| u.username == username).count() as i64)
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn directory() -> UserDirectory<InMemoryRepo> {
        UserDirectory::new(Arc::new(InMemoryRepo::default()))
    }

    fn signup(username: &str, email: &str) -> CreateUser {
        CreateUser::New(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: None,
            send_engagements: None,
            send_notifications: None,
        })
    }

    #[tokio::test]
    async fn created_user_is_reachable_by_id_username_and_email() {
        let directory = directory();
        let created = directory
            .create_user(signup("WebDev", "webdev@example.org"))
            .await
            .unwrap();
        assert_eq!(created.username, "webdev");
        assert_eq!(created.full_name, "WebDev");

        let by_id = directory.get_user(&created.id.to_string()).await.unwrap();
        assert_eq!(by_id.as_ref().map(|u| u.id), Some(created.id));

        // Lookup lowercases, so the typed casing still resolves.
        let by_name = directory.get_user("WebDev").await.unwrap();
        assert_eq!(by_name.as_ref().map(|u| u.id), Some(created.id));

        let by_email = directory.get_user("webdev@example.org").await.unwrap();
        assert_eq!(by_email.as_ref().map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn missing_user_is_none_not_an_error() {
        let directory = directory();
        assert!(directory.get_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_fails_validation() {
        let directory = directory();
        directory
            .create_user(signup("kate", "kate@example.org"))
            .await
            .unwrap();
        let err = directory
            .create_user(signup("Kate", "other@example.org"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
    }

    #[tokio::test]
    async fn digit_only_username_fails_validation() {
        let directory = directory();
        let err = directory
            .create_user(signup("12345", "digits@example.org"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
    }

    #[tokio::test]
    async fn update_patches_named_fields_only() {
        let directory = directory();
        let created = directory
            .create_user(signup("kate", "kate@example.org"))
            .await
            .unwrap();

        let patch: UserPatch = serde_json::from_value(serde_json::json!({
            "fullName": "Kate Example",
            "sendNotifications": false
        }))
        .unwrap();
        let updated = directory.update_user("kate", patch).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.full_name, "Kate Example");
        assert!(!updated.send_notifications);
        assert_eq!(updated.email, "kate@example.org");
    }

    #[tokio::test]
    async fn update_of_missing_user_is_not_found() {
        let directory = directory();
        let err = directory
            .update_user("ghost", UserPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound));
    }

    #[tokio::test]
    async fn update_with_invalid_email_fails_validation() {
        let directory = directory();
        directory
            .create_user(signup("kate", "kate@example.org"))
            .await
            .unwrap();
        let patch = UserPatch {
            email: Some("not-an-address".to_string()),
            ..UserPatch::default()
        };
        let err = directory.update_user("kate", patch).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_returns_the_removed_record() {
        let directory = directory();
        let created = directory
            .create_user(signup("kate", "kate@example.org"))
            .await
            .unwrap();

        let removed = directory.delete_user("kate@example.org").await.unwrap();
        assert_eq!(removed.id, created.id);

        let err = directory.delete_user("kate").await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound));
        assert!(directory.get_user("kate").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn check_username_reports_taken_before_screening() {
        let directory = directory();
        directory
            .create_user(signup("kate", "kate@example.org"))
            .await
            .unwrap();

        let result = directory.check_username("Kate").await.unwrap();
        assert!(result.taken);

        let result = directory.check_username("free-name").await.unwrap();
        assert!(!result.taken);

        // Signup does not screen, so a screened name can be claimed; once
        // held it reports taken rather than reserved.
        directory
            .create_user(signup("admin", "admin@example.org"))
            .await
            .unwrap();
        let result = directory.check_username("admin").await.unwrap();
        assert!(result.taken);
    }

    #[tokio::test]
    async fn check_username_rejects_blank_and_screened_names() {
        let directory = directory();
        let err = directory.check_username("   ").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));

        let err = directory.check_username("admin").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Blacklisted));
    }
}
