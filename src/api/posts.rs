//! Community feed API endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};

use super::{success, ApiResult, PageQuery, Paged, UploadForm};
use crate::auth::{OptionalSession, Session};
use crate::db::check_expected_version;
use crate::errors::{AppError, AppResult};
use crate::models::{
    entry_id, now_timestamp, CommentRequest, Diary, Post, PostView, Stored, UpdatePostRequest,
};
use crate::AppState;

/// Read a post, apply `change` in memory and write the whole document back.
///
/// The write is rejected with `VERSION_MISMATCH` if the post changed in between.
async fn mutate_post<F>(state: &AppState, id: &str, change: F) -> AppResult<Stored<Post>>
where
    F: FnOnce(&mut Post) -> AppResult<()>,
{
    let mut post = state.store.require::<Post>(id).await?;
    change(&mut post.doc)?;
    state.store.save(post).await
}

/// GET /api/posts - List the feed, newest first.
pub async fn list_posts(
    State(state): State<AppState>,
    session: OptionalSession,
    Query(params): Query<PageQuery>,
) -> ApiResult<Paged<PostView>> {
    let (page, limit, offset) = params.bounds();
    let result = state.store.page::<Post>(offset, limit).await?;

    success(Paged {
        items: result
            .items
            .into_iter()
            .map(|p| PostView::new(p, session.user_id()))
            .collect(),
        total: result.total,
        page,
        limit,
    })
}

/// GET /api/posts/:id - Get a single post.
pub async fn get_post(
    State(state): State<AppState>,
    session: OptionalSession,
    Path(id): Path<String>,
) -> ApiResult<PostView> {
    let post = state.store.require::<Post>(&id).await?;
    success(PostView::new(post, session.user_id()))
}

/// POST /api/posts - Create a post from a multipart form.
///
/// Fields: `text` and any number of `media` files, uploaded in order.
pub async fn create_post(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> ApiResult<PostView> {
    let form = UploadForm::read(multipart).await?;
    let text = form.text("text");
    if text.trim().is_empty() && form.files.is_empty() {
        return Err(AppError::Validation(
            "A post needs text or at least one media file".to_string(),
        ));
    }

    let media = state.blobs.upload_media("posts", &form.files).await;
    if media.len() < form.files.len() {
        tracing::warn!(
            "Post by {} keeps {} of {} media files",
            session.user_id,
            media.len(),
            form.files.len()
        );
    }

    let post = Post::new(session.author(), text, media)?;
    let post = state.store.add(post).await?;

    success(PostView::new(post, Some(&session.user_id)))
}

/// PUT /api/posts/:id - Edit the text of a post.
pub async fn update_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> ApiResult<PostView> {
    let mut post = state.store.require::<Post>(&id).await?;
    check_expected_version(&post, request.expected_version)?;

    post.doc.edit_text(&session.user_id, &request.text)?;
    let post = state.store.save(post).await?;

    success(PostView::new(post, Some(&session.user_id)))
}

/// DELETE /api/posts/:id - Delete a post.
pub async fn delete_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let post = state.store.require::<Post>(&id).await?;
    post.doc.ensure_author(&session.user_id)?;
    state.store.delete::<Post>(&post.id).await?;

    match &post.doc.diary_id {
        // Media of a shared diary still belongs to the diary
        Some(diary_id) => release_diary_share(&state, diary_id, &post.id).await,
        None => {
            state
                .blobs
                .delete_urls(post.doc.media.iter().map(|m| m.url.as_str()))
                .await
        }
    }
    success(())
}

/// Mark the diary a deleted post came from as no longer shared.
async fn release_diary_share(state: &AppState, diary_id: &str, post_id: &str) {
    let mut diary = match state.store.get::<Diary>(diary_id).await {
        Ok(Some(diary)) => diary,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!("Failed to load diary {}: {}", diary_id, e);
            return;
        }
    };
    if diary.doc.shared_post_id.as_deref() != Some(post_id) {
        return;
    }

    diary.doc.shared_post_id = None;
    if let Err(e) = state.store.save(diary).await {
        tracing::warn!("Failed to release share of diary {}: {}", diary_id, e);
    }
}

/// POST /api/posts/:id/like - Like or unlike a post.
pub async fn toggle_like(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<PostView> {
    let post = mutate_post(&state, &id, |post| {
        post.toggle_like(&session.user_id);
        Ok(())
    })
    .await?;

    success(PostView::new(post, Some(&session.user_id)))
}

/// POST /api/posts/:id/comments - Add a comment.
pub async fn add_comment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<PostView> {
    let post = mutate_post(&state, &id, |post| {
        post.add_comment(entry_id(), session.author(), &request.text, now_timestamp())
            .map(|_| ())
    })
    .await?;

    success(PostView::new(post, Some(&session.user_id)))
}

/// PUT /api/posts/:id/comments/:comment_id - Edit a comment.
pub async fn update_comment(
    State(state): State<AppState>,
    session: Session,
    Path((id, comment_id)): Path<(String, String)>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<PostView> {
    let post = mutate_post(&state, &id, |post| {
        post.edit_comment(&comment_id, &session.user_id, &request.text, now_timestamp())
    })
    .await?;

    success(PostView::new(post, Some(&session.user_id)))
}

/// DELETE /api/posts/:id/comments/:comment_id - Delete a comment and its replies.
pub async fn delete_comment(
    State(state): State<AppState>,
    session: Session,
    Path((id, comment_id)): Path<(String, String)>,
) -> ApiResult<PostView> {
    let post = mutate_post(&state, &id, |post| {
        post.delete_comment(&comment_id, &session.user_id).map(|_| ())
    })
    .await?;

    success(PostView::new(post, Some(&session.user_id)))
}

/// POST /api/posts/:id/comments/:comment_id/replies - Reply to a comment.
pub async fn add_reply(
    State(state): State<AppState>,
    session: Session,
    Path((id, comment_id)): Path<(String, String)>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<PostView> {
    let post = mutate_post(&state, &id, |post| {
        post.add_reply(
            &comment_id,
            entry_id(),
            session.author(),
            &request.text,
            now_timestamp(),
        )
        .map(|_| ())
    })
    .await?;

    success(PostView::new(post, Some(&session.user_id)))
}

/// DELETE /api/posts/:id/comments/:comment_id/replies/:reply_id - Delete a reply.
pub async fn delete_reply(
    State(state): State<AppState>,
    session: Session,
    Path((id, comment_id, reply_id)): Path<(String, String, String)>,
) -> ApiResult<PostView> {
    let post = mutate_post(&state, &id, |post| {
        post.delete_reply(&comment_id, &reply_id, &session.user_id)
    })
    .await?;

    success(PostView::new(post, Some(&session.user_id)))
}
