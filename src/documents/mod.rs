//! Booking confirmation documents.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::errors::{AppError, AppResult};
use crate::models::{Booking, Stored};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_LEFT: Mm = Mm(20.0);
const TOP: f32 = 270.0;
const BOTTOM: f32 = 20.0;
const LINE_HEIGHT: f32 = 7.0;

/// Text lines of a booking confirmation, in print order.
pub fn confirmation_lines(booking: &Stored<Booking>) -> Vec<String> {
    let b = &booking.doc;
    let mut lines = vec![
        format!("Confirmation code: {}", b.confirmation_code),
        format!("Status: {}", b.status.as_str()),
        String::new(),
        format!("Tour: {}", b.tour_name),
        format!("Date: {}", b.date.format("%A, %d %B %Y")),
        format!("Participants: {}", b.total_pax),
        String::new(),
        format!("Lead contact: {}", b.contact.name),
        format!("Email: {}", b.contact.email),
    ];
    if !b.contact.phone.is_empty() {
        lines.push(format!("Phone: {}", b.contact.phone));
    }

    if !b.additional_pax.is_empty() {
        lines.push(String::new());
        lines.push("Additional participants:".to_string());
        for (i, p) in b.additional_pax.iter().enumerate() {
            let name = if p.name.trim().is_empty() {
                "(to be confirmed)"
            } else {
                p.name.as_str()
            };
            lines.push(format!("  {}. {}", i + 2, name));
        }
    }

    if let Some(notes) = &b.notes {
        lines.push(String::new());
        lines.push(format!("Notes: {}", notes));
    }

    lines.push(String::new());
    lines.push(format!("Booked on {}", booking.created_at.get(..10).unwrap_or("")));
    lines
}

/// Render a booking confirmation as an A4 PDF.
pub fn render_confirmation_pdf(booking: &Stored<Booking>) -> AppResult<Vec<u8>> {
    let title = format!("Booking confirmation {}", booking.doc.confirmation_code);
    let (doc, page, layer) = PdfDocument::new(title.as_str(), PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");

    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut current: PdfLayerReference = doc.get_page(page).get_layer(layer);
    current.use_text("Travelhub Booking Confirmation", 18.0, MARGIN_LEFT, Mm(TOP + 10.0), &bold);

    let mut y = TOP - LINE_HEIGHT;
    for line in confirmation_lines(booking) {
        if y < BOTTOM {
            let (next_page, next_layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = TOP;
        }
        write_line(&current, &line, y, &regular);
        y -= LINE_HEIGHT;
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn write_line(layer: &PdfLayerReference, line: &str, y: f32, font: &IndirectFontRef) {
    if !line.is_empty() {
        layer.use_text(line, 11.0, MARGIN_LEFT, Mm(y), font);
    }
}

fn pdf_error(err: printpdf::Error) -> AppError {
    tracing::error!("PDF error: {:?}", err);
    AppError::Internal(format!("Failed to render PDF: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, Contact, Participant};
    use chrono::NaiveDate;

    fn booking(total_pax: u32, additional: Vec<Participant>) -> Stored<Booking> {
        Stored {
            id: "b1".to_string(),
            version: 1,
            created_at: "2024-03-15T08:00:00.000000Z".to_string(),
            updated_at: "2024-03-15T08:00:00.000000Z".to_string(),
            doc: Booking {
                contact: Contact {
                    name: "Dewi".to_string(),
                    email: "dewi@example.com".to_string(),
                    phone: String::new(),
                },
                tour_id: "t1".to_string(),
                tour_name: "Bali Escape".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                total_pax,
                additional_pax: additional,
                status: BookingStatus::Confirmed,
                confirmation_code: "TRV-240315-4F9A1C".to_string(),
                owner_id: "u1".to_string(),
                notes: None,
            },
        }
    }

    #[test]
    fn test_lines_include_code_and_party() {
        let lines = confirmation_lines(&booking(
            3,
            vec![
                Participant {
                    name: "Eka".to_string(),
                    phone: String::new(),
                },
                Participant::default(),
            ],
        ));

        assert_eq!(lines[0], "Confirmation code: TRV-240315-4F9A1C");
        assert!(lines.contains(&"Tour: Bali Escape".to_string()));
        assert!(lines.contains(&"  2. Eka".to_string()));
        assert!(lines.contains(&"  3. (to be confirmed)".to_string()));
        assert!(lines.contains(&"Booked on 2024-03-15".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Phone:")));
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_confirmation_pdf(&booking(1, Vec::new())).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_spills_onto_extra_pages() {
        let party = (0..60)
            .map(|i| Participant {
                name: format!("Traveller {}", i),
                phone: String::new(),
            })
            .collect();
        let bytes = render_confirmation_pdf(&booking(61, party)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
