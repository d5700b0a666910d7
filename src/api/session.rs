//! Session and profile endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::auth::{AdminSession, Session};
use crate::models::{Role, Stored, UpdateProfileRequest, UpdateRoleRequest, UserProfile};
use crate::AppState;

/// Session details for the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub role: Role,
    pub has_profile: bool,
}

/// GET /api/session - Resolve the caller's session.
pub async fn get_session(State(state): State<AppState>, session: Session) -> ApiResult<SessionInfo> {
    let has_profile = state
        .store
        .get::<UserProfile>(&session.user_id)
        .await?
        .is_some();

    success(SessionInfo {
        user_id: session.user_id,
        display_name: session.display_name,
        photo_url: session.photo_url,
        role: session.role,
        has_profile,
    })
}

/// GET /api/profile - Get the caller's profile.
pub async fn get_profile(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Stored<UserProfile>> {
    success(state.store.require::<UserProfile>(&session.user_id).await?)
}

/// PUT /api/profile - Create or update the caller's profile.
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Stored<UserProfile>> {
    let existing = state.store.get::<UserProfile>(&session.user_id).await?;

    let profile = match existing {
        Some(stored) => {
            let version = stored.version;
            let profile = request.apply(Some(stored.doc), &session.user_id)?;
            state.store.update(&session.user_id, profile, version).await?
        }
        None => {
            let profile = request.apply(None, &session.user_id)?;
            tracing::info!("Created profile for user {}", session.user_id);
            state.store.set(&session.user_id, profile).await?
        }
    };

    success(profile)
}

/// PUT /api/admin/users/:id/role - Assign a role to a user.
pub async fn update_user_role(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<Stored<UserProfile>> {
    let profile = match state.store.get::<UserProfile>(&user_id).await? {
        Some(mut stored) => {
            stored.doc.role = request.role;
            state.store.save(stored).await?
        }
        None => {
            let profile = UserProfile {
                display_name: user_id.clone(),
                email: None,
                photo_url: None,
                role: request.role,
            };
            state.store.set(&user_id, profile).await?
        }
    };

    tracing::info!(
        "Admin {} set role of {} to {:?}",
        admin.user_id,
        user_id,
        request.role
    );
    success(profile)
}
