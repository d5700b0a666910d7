//! Travel diary API endpoints.

use axum::extract::{Multipart, Path, State};

use super::{success, ApiResult, UploadForm};
use crate::auth::Session;
use crate::errors::{AppError, AppResult};
use crate::models::{required_text, Diary, Post, PostView, Stored};
use crate::AppState;

async fn own_diary(state: &AppState, session: &Session, id: &str) -> AppResult<Stored<Diary>> {
    match state.store.get::<Diary>(id).await? {
        Some(diary) if diary.doc.owner_id == session.user_id => Ok(diary),
        _ => Err(AppError::not_found("Diary", id)),
    }
}

/// GET /api/diaries - List the caller's diary entries, newest first.
pub async fn list_diaries(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Vec<Stored<Diary>>> {
    success(
        state
            .store
            .query_by_field::<Diary>("ownerId", &session.user_id)
            .await?,
    )
}

/// POST /api/diaries - Create a diary entry from a multipart form.
///
/// Fields: `title` (required), `text`, `images` (any number), `video` (at most one).
pub async fn create_diary(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> ApiResult<Stored<Diary>> {
    let form = UploadForm::read(multipart).await?;
    let title = required_text("Title", form.text("title"))?;

    let videos = form.files_named("video");
    if videos.len() > 1 {
        return Err(AppError::Validation(
            "A diary entry can hold one video".to_string(),
        ));
    }
    if videos.iter().any(|v| !v.content_type.starts_with("video/")) {
        return Err(AppError::Validation("The video file is not a video".to_string()));
    }
    let images: Vec<_> = form
        .files_named("images")
        .into_iter()
        .filter(|f| {
            let keep = f.content_type.starts_with("image/");
            if !keep {
                tracing::warn!("Skipping non-image diary upload {:?}", f.file_name);
            }
            keep
        })
        .collect();

    let image_urls = state
        .blobs
        .upload_media("diaries", &images)
        .await
        .into_iter()
        .map(|m| m.url)
        .collect();
    let video_url = state
        .blobs
        .upload_media("diaries", &videos)
        .await
        .into_iter()
        .next()
        .map(|m| m.url)
        .unwrap_or_default();

    let diary = Diary {
        title,
        text: form.text("text").trim().to_string(),
        image_urls,
        video_url,
        owner_id: session.user_id,
        shared_post_id: None,
    };
    success(state.store.add(diary).await?)
}

/// GET /api/diaries/:id - Get one of the caller's diary entries.
pub async fn get_diary(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Stored<Diary>> {
    success(own_diary(&state, &session, &id).await?)
}

/// DELETE /api/diaries/:id - Delete a diary entry.
///
/// Media stays in storage when the entry was shared, since the feed post uses it.
pub async fn delete_diary(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let diary = own_diary(&state, &session, &id).await?;
    state.store.delete::<Diary>(&diary.id).await?;

    if diary.doc.shared_post_id.is_none() {
        state
            .blobs
            .delete_urls(
                diary
                    .doc
                    .image_urls
                    .iter()
                    .chain(std::iter::once(&diary.doc.video_url))
                    .map(String::as_str)
                    .filter(|u| !u.is_empty()),
            )
            .await;
    }
    success(())
}

/// POST /api/diaries/:id/share - Publish a diary entry to the community feed.
///
/// The share is recorded on the diary under its version check before the post
/// is written, so concurrent shares yield one post and one `VERSION_MISMATCH`.
pub async fn share_diary(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<PostView> {
    let mut diary = own_diary(&state, &session, &id).await?;
    if let Some(post_id) = &diary.doc.shared_post_id {
        return Err(AppError::Conflict(format!(
            "Diary entry was already shared as post {}",
            post_id
        )));
    }

    let mut post = Post::new(
        session.author(),
        &diary.doc.share_text(),
        diary.doc.share_media(),
    )?;
    post.diary_id = Some(diary.id.clone());

    let post_id = uuid::Uuid::new_v4().to_string();
    diary.doc.shared_post_id = Some(post_id.clone());
    let mut diary = state.store.save(diary).await?;

    let post = match state.store.set(&post_id, post).await {
        Ok(post) => post,
        Err(e) => {
            diary.doc.shared_post_id = None;
            if let Err(undo) = state.store.save(diary).await {
                tracing::warn!("Failed to release share of diary {}: {}", id, undo);
            }
            return Err(e);
        }
    };

    tracing::info!("User {} shared diary {} as post {}", session.user_id, id, post.id);
    success(PostView::new(post, Some(&session.user_id)))
}
