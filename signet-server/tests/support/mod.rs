use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use anyhow::{Context, Result};
use axum_test::TestServer;
use chrono::Utc;
use signet_core::{
    DirectoryError, Health, LookupKey, User, UserDirectory, UserDraft, UsersRepository,
};
use tokio::sync::Mutex;

use signet_server::config::Config;
use signet_server::routes::create_app;
use signet_server::state::AppState;

/// Hash-map stand-in for the Postgres repository, mirroring its
/// uniqueness and not-found behavior. `set_failing` makes every
/// operation answer as if the store were unreachable.
#[derive(Default)]
pub struct InMemoryRepo {
    users: Mutex<HashMap<i64, User>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl InMemoryRepo {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn reachable(&self) -> signet_core::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DirectoryError::Connection(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UsersRepository for InMemoryRepo {
    async fn insert_user(&self, draft: &UserDraft) -> signet_core::Result<User> {
        self.reachable()?;
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

    async fn find_user(&self, key: &LookupKey) -> signet_core::Result<Option<User>> {
        self.reachable()?;
        let users = self.users.lock().await;
        let found = match key {
            LookupKey::Id(id) => users.get(id).cloned(),
            LookupKey::Username(name) => users.values().find(|u| &u.username == name).cloned(),
            LookupKey::Email(email) => users.values().find(|u| &u.email == email).cloned(),
        };
        Ok(found)
    }

    async fn update_user(&self, user: &User) -> signet_core::Result<User> {
        self.reachable()?;
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

    async fn delete_user(&self, id: i64) -> signet_core::Result<()> {
        self.reachable()?;
        let mut users = self.users.lock().await;
        match users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DirectoryError::NotFound),
        }
    }

    async fn count_username(&self, username: &str) -> signet_core::Result<i64> {
        self.reachable()?;
        let users = self.users.lock().await;
        Ok(users.values().filter(|u| u.username == username).count() as i64)
    }

    async fn ping(&self) -> signet_core::Result<()> {
        self.reachable()
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub health: Health,
    pub repo: Arc<InMemoryRepo>,
}

impl fmt::Debug for TestApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestApp")
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}

/// Build a server over the in-memory store, marked connected.
///
/// Tests drive degradation through the returned handles: flip the repo
/// with `set_failing` and record it with `health.mark_disconnected`.
pub fn build_test_app() -> Result<TestApp> {
    let repo = Arc::new(InMemoryRepo::default());
    let store: Arc<dyn UsersRepository> = repo.clone();

    let health = Health::new();
    health.mark_connected();

    let state = AppState::new(
        UserDirectory::new(store),
        health.clone(),
        Arc::new(Config::default()),
    );
    let server = TestServer::new(create_app(state)).context("failed to start test server")?;

    Ok(TestApp {
        server,
        health,
        repo,
    })
}
