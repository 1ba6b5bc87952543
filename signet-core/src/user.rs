//! User records and the payloads that create and modify them.
//!
//! Creation is a closed union of two shapes: a fresh signup and an import
//! of a record from the previous account system. Updates go through
//! [`UserPatch`], which names every mutable column; anything else in the
//! payload is rejected rather than merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, Result};

/// Hard cap on stored usernames; they double as subdomain labels.
pub const MAX_USERNAME_LENGTH: usize = 30;
/// RFC 5321 limit on a full address.
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Display-name cap.
pub const MAX_FULL_NAME_LENGTH: usize = 100;

/// A stored account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Numeric primary key assigned by the store.
    pub id: i64,
    /// Unique contact address.
    pub email: String,
    /// Unique handle, always stored lowercase.
    pub username: String,
    /// Display name; defaults to the username as originally typed.
    pub full_name: String,
    /// Opted in to engagement mail.
    pub send_engagements: bool,
    /// Opted in to notification mail.
    pub send_notifications: bool,
    /// Grants access to the administrative surface.
    pub is_admin: bool,
    /// Suspended accounts keep their record but cannot sign in.
    pub is_suspended: bool,
    /// Set once, at import time, for records carried over from the
    /// previous account system.
    pub was_migrated: bool,
    /// Assigned by the store on insert.
    pub created_at: DateTime<Utc>,
    /// Touched by the store on every write.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Re-check the record against the signup rules. Used after a patch
    /// is applied, before the row is written back.
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_full_name(&self.full_name)?;
        Ok(())
    }
}

/// Payload accepted by user creation.
///
/// The legacy `_id` field selects the import shape; its absence selects a
/// fresh signup. Both shapes reject fields they do not name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateUser {
    /// A record carried over from the previous account system.
    Migrated(MigratedUser),
    /// A fresh signup.
    New(NewUser),
}

/// Fields a fresh signup may carry.
///
/// Administrative flags are deliberately absent; new accounts always start
/// unprivileged and unsuspended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    /// Requested handle, any case; normalized to lowercase on creation.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Optional display name; falls back to the username as typed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_engagements: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_notifications: Option<bool>,
}

/// Fields an imported record may carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MigratedUser {
    /// Identifier from the previous system. Recorded nowhere; its presence
    /// is what marks the payload as an import.
    #[serde(rename = "_id")]
    pub legacy_id: String,
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_engagements: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_suspended: Option<bool>,
}

/// A normalized record ready for insertion. Ids and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub send_engagements: bool,
    pub send_notifications: bool,
    pub is_admin: bool,
    pub is_suspended: bool,
    pub was_migrated: bool,
}

impl UserDraft {
    /// Check the draft against the signup rules.
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_full_name(&self.full_name)?;
        Ok(())
    }
}

impl CreateUser {
    /// Normalize into a draft.
    ///
    /// Usernames are lowercased here; when no display name was given the
    /// username as originally typed becomes the display name, so casing
    /// the signer chose survives in `full_name`.
    pub fn into_draft(self) -> UserDraft {
        match self {
            CreateUser::New(new) => {
                let full_name = new
                    .full_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| new.username.clone());
                UserDraft {
                    email: new.email,
                    username: new.username.to_lowercase(),
                    full_name,
                    send_engagements: new.send_engagements.unwrap_or(true),
                    send_notifications: new.send_notifications.unwrap_or(true),
                    is_admin: false,
                    is_suspended: false,
                    was_migrated: false,
                }
            }
            CreateUser::Migrated(old) => {
                let full_name = old
                    .full_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| old.username.clone());
                UserDraft {
                    email: old.email,
                    username: old.username.to_lowercase(),
                    full_name,
                    send_engagements: old.send_engagements.unwrap_or(true),
                    send_notifications: old.send_notifications.unwrap_or(true),
                    is_admin: old.is_admin.unwrap_or(false),
                    is_suspended: old.is_suspended.unwrap_or(false),
                    was_migrated: true,
                }
            }
        }
    }
}

/// Partial update naming every mutable column.
///
/// `was_migrated` is absent on purpose: it is set once at import time and
/// never changes afterwards. Unknown fields fail deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_engagements: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_suspended: Option<bool>,
}

impl UserPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.full_name.is_none()
            && self.send_engagements.is_none()
            && self.send_notifications.is_none()
            && self.is_admin.is_none()
            && self.is_suspended.is_none()
    }

    /// Fold the patch into an existing record. Usernames are normalized
    /// the same way they are at signup; the result still needs
    /// [`User::validate`] before being written back.
    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(username) = self.username {
            user.username = username.to_lowercase();
        }
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(send_engagements) = self.send_engagements {
            user.send_engagements = send_engagements;
        }
        if let Some(send_notifications) = self.send_notifications {
            user.send_notifications = send_notifications;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
        if let Some(is_suspended) = self.is_suspended {
            user.is_suspended = is_suspended;
        }
    }
}

/// Validate an already-normalized (lowercase) username.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(DirectoryError::Validation(
            "Username must be provided".to_string(),
        ));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(DirectoryError::Validation(format!(
            "Username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    let allowed =
        |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-';
    if !username.bytes().all(allowed) {
        return Err(DirectoryError::Validation(
            "Username may only contain lowercase letters, digits, hyphens and underscores"
                .to_string(),
        ));
    }
    // All-digit names are unreachable through lookup; they classify as ids.
    if username.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DirectoryError::Validation(
            "Username cannot be digits only".to_string(),
        ));
    }
    Ok(())
}

/// Light shape check on an email address; uniqueness is the store's job.
pub fn validate_email(email: &str) -> Result<()> {
    let invalid = || DirectoryError::Validation("Email address is invalid".to_string());
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(invalid());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}

/// Validate a display name.
pub fn validate_full_name(full_name: &str) -> Result<()> {
    if full_name.trim().is_empty() {
        return Err(DirectoryError::Validation(
            "Full name must be provided".to_string(),
        ));
    }
    if full_name.len() > MAX_FULL_NAME_LENGTH {
        return Err(DirectoryError::Validation(format!(
            "Full name must be at most {MAX_FULL_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}
