//! The account CRUD surface.
//!
//! Response bodies wrap the record in a `{"user": ...}` envelope and
//! carry a legacy `_id` alias (the email) that pre-migration consumers
//! still key on.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signet_core::user::{CreateUser, MigratedUser, NewUser, UserPatch};
use signet_core::{User, UsernameAvailability};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Envelope for every user-returning route.
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserDto,
}

/// Wire shape of a user record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Legacy alias for the record: the email address.
    #[serde(rename = "_id")]
    pub legacy_id: String,
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub send_engagements: bool,
    pub send_notifications: bool,
    pub is_admin: bool,
    pub is_suspended: bool,
    pub was_migrated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            legacy_id: user.email.clone(),
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            send_engagements: user.send_engagements,
            send_notifications: user.send_notifications,
            is_admin: user.is_admin,
            is_suspended: user.is_suspended,
            was_migrated: user.was_migrated,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn envelope(user: User) -> Json<UserEnvelope> {
    Json(UserEnvelope { user: user.into() })
}

/// Signup payload as posted on the wire.
///
/// `subdomain` is the historical field name for the requested username;
/// `username` is accepted as an alias for import tooling. A payload
/// naming neither is answered 404, the original route contract. Unknown
/// extra fields are ignored here; the typed creation payloads underneath
/// are strict about the fields they accept.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    #[serde(rename = "_id", default)]
    legacy_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    subdomain: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    send_engagements: Option<bool>,
    #[serde(default)]
    send_notifications: Option<bool>,
    #[serde(default)]
    is_admin: Option<bool>,
    #[serde(default)]
    is_suspended: Option<bool>,
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserBody>, JsonRejection>,
) -> AppResult<Json<UserEnvelope>> {
    let Json(body) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;
    let CreateUserBody {
        legacy_id,
        email,
        subdomain,
        username,
        full_name,
        send_engagements,
        send_notifications,
        is_admin,
        is_suspended,
    } = body;

    let Some(username) = subdomain.or(username) else {
        return Err(AppError::not_found("Subdomain must be provided"));
    };
    let Some(email) = email else {
        return Err(AppError::bad_request("Email must be provided"));
    };

    let input = match legacy_id {
        Some(legacy_id) => CreateUser::Migrated(MigratedUser {
            legacy_id,
            email,
            username,
            full_name,
            send_engagements,
            send_notifications,
            is_admin,
            is_suspended,
        }),
        None => {
            if is_admin.is_some() || is_suspended.is_some() {
                return Err(AppError::bad_request(
                    "Administrative flags cannot be set at signup",
                ));
            }
            CreateUser::New(NewUser {
                username,
                email,
                full_name,
                send_engagements,
                send_notifications,
            })
        }
    };

    let user = state.directory().create_user(input).await?;
    Ok(envelope(user))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<UserEnvelope>> {
    match state.directory().get_user(&key).await? {
        Some(user) => Ok(envelope(user)),
        None => Err(AppError::not_found("User not found")),
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> AppResult<Json<UserEnvelope>> {
    let Json(patch) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;
    let user = state.directory().update_user(&key, patch).await?;
    Ok(envelope(user))
}

/// Deletes and echoes the removed record, so callers can archive it.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<UserEnvelope>> {
    let user = state.directory().delete_user(&key).await?;
    Ok(envelope(user))
}

#[derive(Debug, Deserialize)]
pub struct CheckUsernameBody {
    #[serde(default)]
    username: Option<String>,
}

pub async fn check_username(
    State(state): State<AppState>,
    payload: Result<Json<CheckUsernameBody>, JsonRejection>,
) -> AppResult<Json<UsernameAvailability>> {
    let Json(body) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;
    let username = body.username.unwrap_or_default();
    let availability = state.directory().check_username(&username).await?;
    Ok(Json(availability))
}
