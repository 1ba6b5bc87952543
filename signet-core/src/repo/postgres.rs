//! Postgres-backed implementation of the storage port.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::UsersRepository;
use crate::error::{DirectoryError, Result};
use crate::lookup::LookupKey;
use crate::user::{User, UserDraft};

/// Users repository over a connection pool.
#[derive(Debug, Clone)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a lazily connecting pool.
    ///
    /// The handle is returned without touching the network; connection
    /// failures surface on first use, which lets the service come up in a
    /// degraded state when the store is down. Only a malformed URL fails
    /// here.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)
            .map_err(|e| DirectoryError::Connection(format!("invalid database URL: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| DirectoryError::Connection(format!("schema sync failed: {e}")))
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn insert_user(&self, draft: &UserDraft) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (
                email, username, full_name,
                send_engagements, send_notifications,
                is_admin, is_suspended, was_migrated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, email, username, full_name,
                      send_engagements, send_notifications,
                      is_admin, is_suspended, was_migrated,
                      created_at, updated_at
            "#,
        )
        .bind(&draft.email)
        .bind(&draft.username)
        .bind(&draft.full_name)
        .bind(draft.send_engagements)
        .bind(draft.send_notifications)
        .bind(draft.is_admin)
        .bind(draft.is_suspended)
        .bind(draft.was_migrated)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_err("failed to insert user", e))?;

        let user = row_to_user(&row)?;
        info!("created user {} (id {})", user.username, user.id);
        Ok(user)
    }

    async fn find_user(&self, key: &LookupKey) -> Result<Option<User>> {
        let row = match key {
            LookupKey::Id(id) => {
                sqlx::query(
                    r#"
                    SELECT id, email, username, full_name,
                           send_engagements, send_notifications,
                           is_admin, is_suspended, was_migrated,
                           created_at, updated_at
                    FROM users
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
            }
            LookupKey::Username(username) => {
                sqlx::query(
                    r#"
                    SELECT id, email, username, full_name,
                           send_engagements, send_notifications,
                           is_admin, is_suspended, was_migrated,
                           created_at, updated_at
                    FROM users
                    WHERE username = $1
                    "#,
                )
                .bind(username)
                .fetch_optional(&self.pool)
                .await
            }
            LookupKey::Email(email) => {
                sqlx::query(
                    r#"
                    SELECT id, email, username, full_name,
                           send_engagements, send_notifications,
                           is_admin, is_suspended, was_migrated,
                           created_at, updated_at
                    FROM users
                    WHERE email = $1
                    "#,
                )
                .bind(email)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx("failed to look up user", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        // was_migrated is set once at import and never written back.
        let row = sqlx::query(
            r#"
            UPDATE users
            SET email = $2,
                username = $3,
                full_name = $4,
                send_engagements = $5,
                send_notifications = $6,
                is_admin = $7,
                is_suspended = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, username, full_name,
                      send_engagements, send_notifications,
                      is_admin, is_suspended, was_migrated,
                      created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(user.send_engagements)
        .bind(user.send_notifications)
        .bind(user.is_admin)
        .bind(user.is_suspended)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_err("failed to update user", e))?;

        match row {
            Some(row) => {
                let user = row_to_user(&row)?;
                debug!("updated user {} (id {})", user.username, user.id);
                Ok(user)
            }
            None => Err(DirectoryError::NotFound),
        }
    }

    async fn delete_user(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx("failed to delete user", e))?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound);
        }
        info!("deleted user id {id}");
        Ok(())
    }

    async fn count_username(&self, username: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx("failed to count username", e))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(drop)
            .map_err(|e| DirectoryError::Connection(format!("database probe failed: {e}")))
    }
}

fn row_to_user(row: &PgRow) -> Result<User> {
    let decode =
        |e: sqlx::Error| DirectoryError::Internal(format!("failed to decode user row: {e}"));
    Ok(User {
        id: row.try_get("id").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        username: row.try_get("username").map_err(decode)?,
        full_name: row.try_get("full_name").map_err(decode)?,
        send_engagements: row.try_get("send_engagements").map_err(decode)?,
        send_notifications: row.try_get("send_notifications").map_err(decode)?,
        is_admin: row.try_get("is_admin").map_err(decode)?,
        is_suspended: row.try_get("is_suspended").map_err(decode)?,
        was_migrated: row.try_get("was_migrated").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

/// Classify write failures: unique-index collisions become validation
/// errors the caller can report, everything else falls through to the
/// generic mapping.
fn map_write_err(context: &str, e: sqlx::Error) -> DirectoryError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.constraint() == Some("users_username_key") {
            return DirectoryError::Validation("Username is already taken".to_string());
        }
        if db_err.constraint() == Some("users_email_key") {
            return DirectoryError::Validation("Email address is already registered".to_string());
        }
        if db_err.is_unique_violation() {
            return DirectoryError::Validation("User already exists".to_string());
        }
    }
    map_sqlx(context, e)
}

/// Separate transport failures (store unreachable) from everything else.
fn map_sqlx(context: &str, e: sqlx::Error) -> DirectoryError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => DirectoryError::Connection(format!("{context}: {e}")),
        other => DirectoryError::Internal(format!("{context}: {other}")),
    }
}
