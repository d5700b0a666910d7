//! Booking API endpoints.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use super::{success, ApiResult};
use crate::auth::{AdminSession, Session};
use crate::db::check_expected_version;
use crate::documents::render_confirmation_pdf;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Booking, BookingStatus, CreateBookingRequest, Stored, Tour, UpdateBookingRequest,
    UpdateBookingStatusRequest,
};
use crate::AppState;

/// Load a booking the caller owns, or any booking for admins.
async fn accessible_booking(
    state: &AppState,
    session: &Session,
    id: &str,
) -> AppResult<Stored<Booking>> {
    let booking = state.store.require::<Booking>(id).await?;
    session.ensure_owner_or_admin(&booking.doc.owner_id)?;
    Ok(booking)
}

/// GET /api/bookings - List the caller's bookings.
pub async fn list_my_bookings(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Vec<Stored<Booking>>> {
    success(
        state
            .store
            .query_by_field::<Booking>("ownerId", &session.user_id)
            .await?,
    )
}

/// GET /api/bookings/all - List every booking.
pub async fn list_all_bookings(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> ApiResult<Vec<Stored<Booking>>> {
    success(state.store.list::<Booking>().await?)
}

/// POST /api/bookings - Create a booking.
pub async fn create_booking(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateBookingRequest>,
) -> ApiResult<Stored<Booking>> {
    let owner_id = match request.owner_id.as_deref().map(str::trim) {
        Some(owner) if !owner.is_empty() && owner != session.user_id => {
            if !session.is_admin() {
                return Err(AppError::Forbidden(
                    "Only administrators can book on behalf of another user".to_string(),
                ));
            }
            owner.to_string()
        }
        _ => session.user_id.clone(),
    };

    let tour = state
        .store
        .get::<Tour>(&request.tour_id)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Tour {} does not exist", request.tour_id)))?;

    let booking = request.into_booking(owner_id, tour.doc.name, Utc::now().date_naive())?;
    let booking = state.store.add(booking).await?;

    tracing::info!(
        "Booking {} ({}) created by {} for {}",
        booking.id,
        booking.doc.confirmation_code,
        session.user_id,
        booking.doc.owner_id
    );
    success(booking)
}

/// GET /api/bookings/:id - Get a booking.
pub async fn get_booking(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Stored<Booking>> {
    success(accessible_booking(&state, &session, &id).await?)
}

/// PUT /api/bookings/:id - Update booking details.
pub async fn update_booking(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(request): Json<UpdateBookingRequest>,
) -> ApiResult<Stored<Booking>> {
    let mut booking = accessible_booking(&state, &session, &id).await?;
    check_expected_version(&booking, request.expected_version)?;

    let closed = matches!(
        booking.doc.status,
        BookingStatus::Cancelled | BookingStatus::Completed
    );
    if closed && !session.is_admin() {
        return Err(AppError::Conflict(format!(
            "Booking is {} and can no longer be changed",
            booking.doc.status.as_str()
        )));
    }

    request.apply(&mut booking.doc)?;
    success(state.store.save(booking).await?)
}

/// PUT /api/bookings/:id/status - Change the booking status.
pub async fn update_booking_status(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<String>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> ApiResult<Stored<Booking>> {
    let mut booking = state.store.require::<Booking>(&id).await?;
    check_expected_version(&booking, request.expected_version)?;

    tracing::info!(
        "Admin {} moved booking {} from {} to {}",
        admin.user_id,
        booking.id,
        booking.doc.status.as_str(),
        request.status.as_str()
    );
    booking.doc.status = request.status;
    success(state.store.save(booking).await?)
}

/// DELETE /api/bookings/:id - Delete a booking.
pub async fn delete_booking(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let booking = accessible_booking(&state, &session, &id).await?;
    state.store.delete::<Booking>(&booking.id).await?;
    success(())
}

/// GET /api/bookings/:id/confirmation.pdf - Download the confirmation document.
pub async fn booking_confirmation_pdf(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let booking = accessible_booking(&state, &session, &id).await?;
    let pdf = render_confirmation_pdf(&booking)?;

    let disposition = format!(
        "attachment; filename=\"{}.pdf\"",
        booking.doc.confirmation_code
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}
