//! Round-trip coverage for the Postgres repository.
//!
//! These run against a live database provisioned by `#[sqlx::test]`,
//! so they are ignored unless a `DATABASE_URL` is available.

use std::sync::Arc;

use anyhow::Result;
use signet_core::repo::postgres::PostgresUsersRepository;
use signet_core::{CreateUser, DirectoryError, NewUser, UserDirectory, UserPatch, UsersRepository};
use sqlx::PgPool;

fn directory(pool: PgPool) -> UserDirectory<dyn UsersRepository> {
    let repo: Arc<dyn UsersRepository> = Arc::new(PostgresUsersRepository::new(pool));
    UserDirectory::new(repo)
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

#[ignore = "requires a PostgreSQL instance"]
#[sqlx::test(migrator = "signet_core::MIGRATOR")]
async fn directory_round_trip(pool: PgPool) -> Result<()> {
    let directory = directory(pool);
    directory.ping().await?;

    // Create and read back through every key shape.
    let created = directory.create_user(signup("Tester", "tester@example.org")).await?;
    assert_eq!(created.username, "tester");
    assert_eq!(created.full_name, "Tester");
    assert!(created.send_engagements);
    assert!(!created.is_admin);
    assert!(!created.was_migrated);

    let by_id = directory.get_user(&created.id.to_string()).await?;
    assert_eq!(by_id.as_ref().map(|u| u.id), Some(created.id));
    let by_name = directory.get_user("tester").await?;
    assert_eq!(by_name.as_ref().map(|u| u.id), Some(created.id));
    let by_email = directory.get_user("tester@example.org").await?;
    assert_eq!(by_email.as_ref().map(|u| u.id), Some(created.id));

    // Patch a couple of fields and confirm the row was written back.
    let patch: UserPatch = serde_json::from_value(serde_json::json!({
        "fullName": "Tester Prime",
        "sendNotifications": false
    }))?;
    let updated = directory.update_user("tester", patch).await?;
    assert_eq!(updated.full_name, "Tester Prime");
    assert!(!updated.send_notifications);
    assert!(updated.updated_at >= created.updated_at);

    // Availability flips with the record's existence.
    assert!(directory.check_username("tester").await?.taken);

    let removed = directory.delete_user("tester@example.org").await?;
    assert_eq!(removed.id, created.id);
    assert!(!directory.check_username("tester").await?.taken);
    let err = directory.delete_user("tester").await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound));

    Ok(())
}

#[ignore = "requires a PostgreSQL instance"]
#[sqlx::test(migrator = "signet_core::MIGRATOR")]
async fn unique_indexes_surface_as_validation_errors(pool: PgPool) -> Result<()> {
    let directory = directory(pool);
    directory.create_user(signup("kate", "kate@example.org")).await?;

    // Same name, different address: the username index answers.
    let err = directory
        .create_user(signup("kate", "second@example.org"))
        .await
        .unwrap_err();
    assert!(matches!(&err, DirectoryError::Validation(msg) if msg == "Username is already taken"));

    // Different name, same address: the email index answers.
    let err = directory
        .create_user(signup("kate2", "kate@example.org"))
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        DirectoryError::Validation(msg) if msg == "Email address is already registered"
    ));

    Ok(())
}
