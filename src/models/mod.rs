//! Data models for the Travelhub application.
//!
//! Every model is a document stored in one collection of the document store and
//! is serialized with camelCase field names for the web client.

mod booking;
mod diary;
mod post;
mod todo;
mod tour;
mod user;

pub use booking::*;
pub use diary::*;
pub use post::*;
pub use todo::*;
pub use tour::*;
pub use user::*;

use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A type persisted as a JSON document in a named collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name in the document store.
    const COLLECTION: &'static str;
    /// Human readable kind used in error messages.
    const KIND: &'static str;
}

/// A document together with the metadata the store keeps for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stored<T> {
    pub id: String,
    /// Incremented on every write, used for optimistic concurrency control
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub doc: T,
}

/// Current time as a fixed-width RFC 3339 timestamp, so timestamps sort lexically.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// ID for entries embedded in a document (comments, replies).
///
/// Millisecond prefix keeps entries time ordered; the random suffix keeps two
/// entries created in the same millisecond apart.
pub fn entry_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

/// Trim `text` and reject it when nothing is left.
pub fn required_text(field: &str, text: &str) -> crate::errors::AppResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(crate::errors::AppError::Validation(format!(
            "{} is required",
            field
        )));
    }
    Ok(trimmed.to_string())
}
