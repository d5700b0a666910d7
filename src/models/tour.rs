//! Tour card model.

use serde::{Deserialize, Serialize};

use super::{Document, Stored};
use crate::errors::{AppError, AppResult};

/// Number of ID characters used in display routes.
pub const SHORT_ID_LEN: usize = 8;

/// Text kept in English and in the local language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BilingualText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub local: String,
}

/// One day of a tour itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub day: u32,
    #[serde(default)]
    pub route: BilingualText,
    #[serde(default)]
    pub details: BilingualText,
}

/// Gallery image, normalized from either a bare URL or a `{url, caption}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GalleryEntry")]
pub struct GalleryImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Shapes a gallery entry can take in stored documents and requests.
#[derive(Deserialize)]
#[serde(untagged)]
enum GalleryEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        caption: Option<String>,
    },
}

impl From<GalleryEntry> for GalleryImage {
    fn from(entry: GalleryEntry) -> Self {
        match entry {
            GalleryEntry::Url(url) => GalleryImage { url, caption: None },
            GalleryEntry::Detailed { url, caption } => GalleryImage {
                url,
                caption: caption.filter(|c| !c.trim().is_empty()),
            },
        }
    }
}

/// A sellable itinerary product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    #[serde(default)]
    pub cover_images: Vec<String>,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_from: Option<f64>,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

impl Document for Tour {
    const COLLECTION: &'static str = "tours";
    const KIND: &'static str = "Tour";
}

impl Tour {
    /// Remove the gallery image at `index`, keeping the others in order.
    pub fn remove_gallery_image(&mut self, index: usize) -> AppResult<GalleryImage> {
        if index >= self.gallery.len() {
            return Err(AppError::BadRequest(format!(
                "Gallery index {} out of range (gallery has {} images)",
                index,
                self.gallery.len()
            )));
        }
        Ok(self.gallery.remove(index))
    }

    /// All itinerary text in both languages, for indexing.
    pub fn itinerary_text(&self) -> String {
        self.itinerary
            .iter()
            .flat_map(|d| [&d.route.en, &d.route.local, &d.details.en, &d.details.local])
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn sort_itinerary(&mut self) {
        self.itinerary.sort_by_key(|d| d.day);
    }
}

/// First characters of a tour ID, used in display routes.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Tour as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourView {
    #[serde(flatten)]
    pub tour: Stored<Tour>,
    pub short_id: String,
    pub duration_days: usize,
}

impl From<Stored<Tour>> for TourView {
    fn from(tour: Stored<Tour>) -> Self {
        Self {
            short_id: short_id(&tour.id).to_string(),
            duration_days: tour.doc.itinerary.len(),
            tour,
        }
    }
}

/// Request body for creating a new tour.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    #[serde(default)]
    pub cover_images: Vec<String>,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub price_from: Option<f64>,
    #[serde(default)]
    pub published: Option<bool>,
}

impl CreateTourRequest {
    pub fn into_tour(self) -> AppResult<Tour> {
        let mut tour = Tour {
            name: super::required_text("Tour name", &self.name)?,
            description: self.description,
            itinerary: self.itinerary,
            gallery: self.gallery,
            cover_images: self.cover_images,
            inclusions: self.inclusions,
            exclusions: self.exclusions,
            price_from: self.price_from,
            published: self.published.unwrap_or(true),
        };
        tour.sort_itinerary();
        Ok(tour)
    }
}

/// Request body for updating an existing tour.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTourRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub itinerary: Option<Vec<ItineraryDay>>,
    #[serde(default)]
    pub gallery: Option<Vec<GalleryImage>>,
    #[serde(default)]
    pub cover_images: Option<Vec<String>>,
    #[serde(default)]
    pub inclusions: Option<Vec<String>>,
    #[serde(default)]
    pub exclusions: Option<Vec<String>>,
    #[serde(default)]
    pub price_from: Option<f64>,
    #[serde(default)]
    pub published: Option<bool>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl UpdateTourRequest {
    /// Merge the provided fields over `tour`.
    pub fn apply(self, tour: &mut Tour) -> AppResult<()> {
        if let Some(name) = self.name {
            tour.name = super::required_text("Tour name", &name)?;
        }
        if let Some(description) = self.description {
            tour.description = description;
        }
        if let Some(itinerary) = self.itinerary {
            tour.itinerary = itinerary;
            tour.sort_itinerary();
        }
        if let Some(gallery) = self.gallery {
            tour.gallery = gallery;
        }
        if let Some(cover_images) = self.cover_images {
            tour.cover_images = cover_images;
        }
        if let Some(inclusions) = self.inclusions {
            tour.inclusions = inclusions;
        }
        if let Some(exclusions) = self.exclusions {
            tour.exclusions = exclusions;
        }
        if self.price_from.is_some() {
            tour.price_from = self.price_from;
        }
        if let Some(published) = self.published {
            tour.published = published;
        }
        Ok(())
    }
}
