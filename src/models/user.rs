//! User profile model.

use serde::{Deserialize, Serialize};

use super::Document;
use crate::errors::AppResult;

/// Access level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Profile document, keyed by the identity provider's user ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Document for UserProfile {
    const COLLECTION: &'static str = "users";
    const KIND: &'static str = "User";
}

/// Request body for creating or updating the caller's own profile.
///
/// The role cannot be changed here; see [`UpdateRoleRequest`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl UpdateProfileRequest {
    /// Merge over an existing profile, or start one for a first-time user.
    pub fn apply(self, existing: Option<UserProfile>, user_id: &str) -> AppResult<UserProfile> {
        let mut profile = existing.unwrap_or_else(|| UserProfile {
            display_name: user_id.to_string(),
            email: None,
            photo_url: None,
            role: Role::User,
        });
        if let Some(display_name) = self.display_name {
            profile.display_name = super::required_text("Display name", &display_name)?;
        }
        if let Some(email) = self.email {
            profile.email = Some(email).filter(|e| !e.trim().is_empty());
        }
        if let Some(photo_url) = self.photo_url {
            profile.photo_url = Some(photo_url).filter(|p| !p.trim().is_empty());
        }
        Ok(profile)
    }
}

/// Request body for an admin role assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}
