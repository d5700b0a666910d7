//! Booking model and participant list rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Document;
use crate::errors::{AppError, AppResult};

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

/// Lead contact for a booking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// A traveller in the party besides the lead contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// A reservation against a tour for a date and party size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub contact: Contact,
    pub tour_id: String,
    #[serde(default)]
    pub tour_name: String,
    pub date: NaiveDate,
    pub total_pax: u32,
    #[serde(default)]
    pub additional_pax: Vec<Participant>,
    #[serde(default)]
    pub status: BookingStatus,
    pub confirmation_code: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Document for Booking {
    const COLLECTION: &'static str = "bookings";
    const KIND: &'static str = "Booking";
}

/// Resize the additional participant list to match `total_pax`.
///
/// The lead contact counts as one traveller, so the list holds `total_pax - 1`
/// entries. Growing appends empty placeholders; shrinking drops entries from
/// the end and leaves the retained ones untouched.
pub fn resize_additional_pax(participants: &mut Vec<Participant>, total_pax: u32) {
    let wanted = total_pax.saturating_sub(1) as usize;
    participants.resize_with(wanted, Participant::default);
}

/// Generate a confirmation code such as `TRV-240315-4F9A1C`.
pub fn confirmation_code(created_on: NaiveDate) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "TRV-{}-{}",
        created_on.format("%y%m%d"),
        random[..6].to_uppercase()
    )
}

fn validate_contact(contact: &Contact) -> AppResult<Contact> {
    let name = super::required_text("Contact name", &contact.name)?;
    let email = super::required_text("Contact email", &contact.email)?;
    if !email.contains('@') {
        return Err(AppError::Validation(format!(
            "Contact email {} is not valid",
            email
        )));
    }
    Ok(Contact {
        name,
        email,
        phone: contact.phone.trim().to_string(),
    })
}

/// Largest party a single booking may hold.
pub const MAX_PARTY_SIZE: u32 = 50;

fn validate_total_pax(total_pax: u32) -> AppResult<()> {
    if total_pax == 0 {
        return Err(AppError::Validation(
            "Total participants must be at least 1".to_string(),
        ));
    }
    if total_pax > MAX_PARTY_SIZE {
        return Err(AppError::Validation(format!(
            "Total participants cannot exceed {}",
            MAX_PARTY_SIZE
        )));
    }
    Ok(())
}

/// Request body for creating a booking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub contact: Contact,
    pub tour_id: String,
    pub date: NaiveDate,
    pub total_pax: u32,
    #[serde(default)]
    pub additional_pax: Vec<Participant>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Customer the booking is made for; only honored for admins
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl CreateBookingRequest {
    /// Validate the request and build a pending booking.
    pub fn into_booking(
        self,
        owner_id: String,
        tour_name: String,
        created_on: NaiveDate,
    ) -> AppResult<Booking> {
        let contact = validate_contact(&self.contact)?;
        validate_total_pax(self.total_pax)?;

        let mut additional_pax = self.additional_pax;
        resize_additional_pax(&mut additional_pax, self.total_pax);

        Ok(Booking {
            contact,
            tour_id: self.tour_id,
            tour_name,
            date: self.date,
            total_pax: self.total_pax,
            additional_pax,
            status: BookingStatus::Pending,
            confirmation_code: confirmation_code(created_on),
            owner_id,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Request body for updating a booking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub total_pax: Option<u32>,
    #[serde(default)]
    pub additional_pax: Option<Vec<Participant>>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl UpdateBookingRequest {
    /// Merge the provided fields over `booking`, then resize the party.
    pub fn apply(self, booking: &mut Booking) -> AppResult<()> {
        if let Some(contact) = self.contact {
            booking.contact = validate_contact(&contact)?;
        }
        if let Some(date) = self.date {
            booking.date = date;
        }
        if let Some(total_pax) = self.total_pax {
            validate_total_pax(total_pax)?;
            booking.total_pax = total_pax;
        }
        if let Some(additional_pax) = self.additional_pax {
            booking.additional_pax = additional_pax;
        }
        if let Some(notes) = self.notes {
            booking.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }
        resize_additional_pax(&mut booking.additional_pax, booking.total_pax);
        Ok(())
    }
}

/// Request body for an admin status change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(name: &str) -> Participant {
        Participant {
            name: name.to_string(),
            phone: String::new(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_growing_party_appends_placeholders() {
        let mut pax = vec![named("Ayu")];
        resize_additional_pax(&mut pax, 4);

        assert_eq!(pax.len(), 3);
        assert_eq!(pax[0], named("Ayu"));
        assert_eq!(pax[1], Participant::default());
        assert_eq!(pax[2], Participant::default());
    }

    #[test]
    fn test_shrinking_party_keeps_retained_entries() {
        let mut pax = vec![named("Ayu"), named("Budi"), named("Citra")];
        resize_additional_pax(&mut pax, 3);

        assert_eq!(pax, vec![named("Ayu"), named("Budi")]);

        resize_additional_pax(&mut pax, 1);
        assert!(pax.is_empty());
    }

    #[test]
    fn test_confirmation_code_format() {
        let code = confirmation_code(date());
        assert!(code.starts_with("TRV-240315-"));
        assert_eq!(code.len(), "TRV-240315-ABCDEF".len());
        assert_eq!(code, code.to_uppercase());
    }

    #[test]
    fn test_create_request_builds_pending_booking() {
        let request: CreateBookingRequest = serde_json::from_value(json!({
            "contact": { "name": "Dewi", "email": "dewi@example.com" },
            "tourId": "tour-1",
            "date": "2024-07-01",
            "totalPax": 3
        }))
        .unwrap();

        let booking = request
            .into_booking("user-1".to_string(), "Bali Escape".to_string(), date())
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.additional_pax.len(), 2);
        assert_eq!(booking.tour_name, "Bali Escape");
        assert!(booking.confirmation_code.starts_with("TRV-"));
    }

    #[test]
    fn test_create_request_rejects_missing_contact_and_empty_party() {
        let no_email: CreateBookingRequest = serde_json::from_value(json!({
            "contact": { "name": "Dewi", "email": " " },
            "tourId": "tour-1",
            "date": "2024-07-01",
            "totalPax": 1
        }))
        .unwrap();
        assert!(no_email
            .into_booking("u".to_string(), String::new(), date())
            .is_err());

        let no_pax: CreateBookingRequest = serde_json::from_value(json!({
            "contact": { "name": "Dewi", "email": "dewi@example.com" },
            "tourId": "tour-1",
            "date": "2024-07-01",
            "totalPax": 0
        }))
        .unwrap();
        assert!(no_pax
            .into_booking("u".to_string(), String::new(), date())
            .is_err());
    }

    #[test]
    fn test_update_resizes_after_merge() {
        let mut booking = CreateBookingRequest {
            contact: Contact {
                name: "Dewi".to_string(),
                email: "dewi@example.com".to_string(),
                phone: String::new(),
            },
            tour_id: "tour-1".to_string(),
            date: date(),
            total_pax: 2,
            additional_pax: vec![named("Eka")],
            notes: None,
            owner_id: None,
        }
        .into_booking("u".to_string(), String::new(), date())
        .unwrap();

        let update: UpdateBookingRequest =
            serde_json::from_value(json!({ "totalPax": 4 })).unwrap();
        update.apply(&mut booking).unwrap();

        assert_eq!(booking.total_pax, 4);
        assert_eq!(booking.additional_pax.len(), 3);
        assert_eq!(booking.additional_pax[0], named("Eka"));
    }

    #[test]
    fn test_party_size_is_capped() {
        let too_big: CreateBookingRequest = serde_json::from_value(json!({
            "contact": { "name": "Dewi", "email": "dewi@example.com" },
            "tourId": "tour-1",
            "date": "2024-07-01",
            "totalPax": MAX_PARTY_SIZE + 1
        }))
        .unwrap();
        assert!(matches!(
            too_big.into_booking("u".to_string(), String::new(), date()),
            Err(AppError::Validation(_))
        ));

        let mut booking = CreateBookingRequest {
            contact: Contact {
                name: "Dewi".to_string(),
                email: "dewi@example.com".to_string(),
                phone: String::new(),
            },
            tour_id: "tour-1".to_string(),
            date: date(),
            total_pax: MAX_PARTY_SIZE,
            additional_pax: Vec::new(),
            notes: None,
            owner_id: None,
        }
        .into_booking("u".to_string(), String::new(), date())
        .unwrap();
        assert_eq!(booking.additional_pax.len(), (MAX_PARTY_SIZE - 1) as usize);

        let update: UpdateBookingRequest =
            serde_json::from_value(json!({ "totalPax": 20_000_000 })).unwrap();
        assert!(matches!(
            update.apply(&mut booking),
            Err(AppError::Validation(_))
        ));
        assert_eq!(booking.total_pax, MAX_PARTY_SIZE);
    }
}
