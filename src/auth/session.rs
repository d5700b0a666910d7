//! Per-request session resolution and access guards.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::{AppError, AppResult};
use crate::models::{AuthorSnapshot, Role, UserProfile};
use crate::AppState;

/// Header carrying the user ID asserted by the identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the caller, resolved from the identity header and the profile document.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub role: Role,
}

impl Session {
    /// Build the session for `user_id` from its profile, if one exists yet.
    pub async fn resolve(state: &AppState, user_id: &str) -> AppResult<Self> {
        let profile = state.store.get::<UserProfile>(user_id).await?;
        let configured_admin = state.config.is_admin_id(user_id);

        let session = match profile {
            Some(p) => Session {
                user_id: user_id.to_string(),
                display_name: p.doc.display_name,
                photo_url: p.doc.photo_url,
                role: if configured_admin { Role::Admin } else { p.doc.role },
            },
            None => Session {
                user_id: user_id.to_string(),
                display_name: user_id.to_string(),
                photo_url: None,
                role: if configured_admin { Role::Admin } else { Role::User },
            },
        };
        Ok(session)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Snapshot of the caller for embedding in posts and comments.
    pub fn author(&self) -> AuthorSnapshot {
        AuthorSnapshot {
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }

    /// Allow the owner of a document or an admin.
    pub fn ensure_owner_or_admin(&self, owner_id: &str) -> AppResult<()> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have access to this resource".to_string(),
            ))
        }
    }
}

fn user_id_header(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = user_id_header(parts)
            .ok_or_else(|| AppError::Unauthorized("Sign in to continue".to_string()))?;
        Session::resolve(state, &user_id).await
    }
}

/// Session that is only extracted for admins.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        if !session.is_admin() {
            tracing::warn!("User {} denied admin access to {}", session.user_id, parts.uri.path());
            return Err(AppError::Forbidden("Administrator access required".to_string()));
        }
        Ok(AdminSession(session))
    }
}

/// Session for public views that personalize output when the caller is known.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<Session>);

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match user_id_header(parts) {
            Some(user_id) => Ok(OptionalSession(Some(
                Session::resolve(state, &user_id).await?,
            ))),
            None => Ok(OptionalSession(None)),
        }
    }
}

impl OptionalSession {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(Session::is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: &str, role: Role) -> Session {
        Session {
            user_id: user_id.to_string(),
            display_name: "Made".to_string(),
            photo_url: None,
            role,
        }
    }

    #[test]
    fn test_owner_or_admin() {
        assert!(session("u1", Role::User).ensure_owner_or_admin("u1").is_ok());
        assert!(session("u2", Role::User).ensure_owner_or_admin("u1").is_err());
        assert!(session("u2", Role::Admin).ensure_owner_or_admin("u1").is_ok());
    }

    #[test]
    fn test_author_snapshot() {
        let author = session("u1", Role::User).author();
        assert_eq!(author.user_id, "u1");
        assert_eq!(author.display_name, "Made");
    }
}
