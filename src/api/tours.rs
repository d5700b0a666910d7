//! Tour API endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult, UploadForm};
use crate::auth::{AdminSession, OptionalSession};
use crate::db::{check_expected_version, DocumentStore};
use crate::errors::{AppError, AppResult};
use crate::models::{
    CreateTourRequest, GalleryImage, Stored, Tour, TourView, UpdateTourRequest, SHORT_ID_LEN,
};
use crate::AppState;

/// Tour list query parameters.
#[derive(Debug, Deserialize)]
pub struct TourListQuery {
    /// Optional full-text search string.
    #[serde(default)]
    pub q: Option<String>,
    /// Include unpublished tours (admins only).
    #[serde(default)]
    pub all: bool,
    /// Maximum number of search results (default: 20).
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    20
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// Look a tour up by full ID or by its short display ID.
async fn resolve_tour(store: &DocumentStore, id: &str) -> AppResult<Stored<Tour>> {
    if let Some(tour) = store.get::<Tour>(id).await? {
        return Ok(tour);
    }
    if id.len() > SHORT_ID_LEN || id.is_empty() {
        return Err(AppError::not_found("Tour", id));
    }

    let mut matches = store.find_by_id_prefix::<Tour>(id).await?;
    match matches.len() {
        0 => Err(AppError::not_found("Tour", id)),
        1 => Ok(matches.remove(0)),
        n => Err(AppError::BadRequest(format!(
            "Short ID {} matches {} tours",
            id, n
        ))),
    }
}

async fn reindex(state: &AppState, tour: &Stored<Tour>) {
    if let Err(e) = state.search.index_tour(tour).await {
        tracing::warn!("Failed to index tour {}: {}", tour.id, e);
    }
}

/// GET /api/tours - List tours, optionally filtered by a search query.
pub async fn list_tours(
    State(state): State<AppState>,
    session: OptionalSession,
    Query(params): Query<TourListQuery>,
) -> ApiResult<Vec<TourView>> {
    let include_hidden = params.all && session.is_admin();

    let tours = match params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let limit = params.limit.min(MAX_SEARCH_LIMIT);
            let mut found = Vec::new();
            for hit in state.search.search(q, limit)? {
                // Hits for tours deleted since the last commit are skipped
                if let Some(tour) = state.store.get::<Tour>(&hit.tour_id).await? {
                    found.push(tour);
                }
            }
            found
        }
        None => state.store.list::<Tour>().await?,
    };

    success(
        tours
            .into_iter()
            .filter(|t| include_hidden || t.doc.published)
            .map(TourView::from)
            .collect(),
    )
}

/// GET /api/tours/:id - Get a tour by full or short ID.
pub async fn get_tour(
    State(state): State<AppState>,
    session: OptionalSession,
    Path(id): Path<String>,
) -> ApiResult<TourView> {
    let tour = resolve_tour(&state.store, &id).await?;
    if !tour.doc.published && !session.is_admin() {
        return Err(AppError::not_found("Tour", &id));
    }
    success(tour.into())
}

/// POST /api/tours - Create a tour.
pub async fn create_tour(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Json(request): Json<CreateTourRequest>,
) -> ApiResult<TourView> {
    let tour = state.store.add(request.into_tour()?).await?;
    reindex(&state, &tour).await;

    tracing::info!("Admin {} created tour {}", admin.user_id, tour.id);
    success(tour.into())
}

/// PUT /api/tours/:id - Update a tour.
pub async fn update_tour(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    Json(request): Json<UpdateTourRequest>,
) -> ApiResult<TourView> {
    let mut tour = resolve_tour(&state.store, &id).await?;
    check_expected_version(&tour, request.expected_version)?;

    request.apply(&mut tour.doc)?;
    let tour = state.store.save(tour).await?;
    reindex(&state, &tour).await;

    success(tour.into())
}

/// DELETE /api/tours/:id - Delete a tour and its uploaded images.
pub async fn delete_tour(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let tour = resolve_tour(&state.store, &id).await?;
    state.store.delete::<Tour>(&tour.id).await?;

    if let Err(e) = state.search.remove_tour(&tour.id).await {
        tracing::warn!("Failed to remove tour {} from index: {}", tour.id, e);
    }
    state
        .blobs
        .delete_urls(
            tour.doc
                .gallery
                .iter()
                .map(|g| g.url.as_str())
                .chain(tour.doc.cover_images.iter().map(String::as_str)),
        )
        .await;

    tracing::info!("Admin {} deleted tour {}", admin.user_id, tour.id);
    success(())
}

/// POST /api/tours/:id/gallery - Upload images and append them to the gallery.
pub async fn upload_gallery_images(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<TourView> {
    let form = UploadForm::read(multipart).await?;
    let caption = Some(form.text("caption").trim().to_string()).filter(|c| !c.is_empty());

    let images: Vec<_> = form
        .files
        .into_iter()
        .filter(|f| f.content_type.starts_with("image/"))
        .collect();
    if images.is_empty() {
        return Err(AppError::Validation(
            "Select at least one image to upload".to_string(),
        ));
    }

    let mut tour = resolve_tour(&state.store, &id).await?;
    let uploaded = state.blobs.upload_media("tours", &images).await;
    if uploaded.is_empty() {
        return Err(AppError::Storage("No image could be stored".to_string()));
    }

    tour.doc
        .gallery
        .extend(uploaded.into_iter().map(|m| GalleryImage {
            url: m.url,
            caption: caption.clone(),
        }));
    let tour = state.store.save(tour).await?;

    success(tour.into())
}

/// DELETE /api/tours/:id/gallery/:index - Remove one gallery image.
pub async fn delete_gallery_image(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path((id, index)): Path<(String, usize)>,
) -> ApiResult<TourView> {
    let mut tour = resolve_tour(&state.store, &id).await?;
    let removed = tour.doc.remove_gallery_image(index)?;
    let tour = state.store.save(tour).await?;

    if let Err(e) = state.blobs.delete_url(&removed.url).await {
        tracing::warn!("Failed to delete gallery image {}: {}", removed.url, e);
    }

    success(tour.into())
}
