//! REST API module.
//!
//! Contains all API routes and handlers.

mod bookings;
mod diaries;
mod integrations;
mod posts;
mod session;
mod todos;
mod tours;

pub use bookings::*;
pub use diaries::*;
pub use integrations::*;
pub use posts::*;
pub use session::*;
pub use todos::*;
pub use tours::*;

use std::collections::HashMap;

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::storage::PendingFile;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse {
        success: true,
        data,
    })
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number (default: 1).
    #[serde(default = "default_page")]
    pub page: usize,
    /// Items per page (default: 12).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    12
}

/// Maximum number of items per page.
const MAX_PAGE_LIMIT: usize = 50;

impl PageQuery {
    /// Clamped `(page, limit, offset)`.
    pub fn bounds(&self) -> (usize, usize, usize) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, MAX_PAGE_LIMIT);
        (page, limit, (page - 1) * limit)
    }
}

/// One page of results.
#[derive(Debug, Serialize)]
pub struct Paged<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Text fields and files of a multipart form, in arrival order.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<PendingFile>,
}

impl UploadForm {
    /// Read the whole form into memory.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            crate::storage::content_type_from_name(
                                &file_name,
                                "application/octet-stream",
                            )
                        });
                    let data = field.bytes().await?;
                    if data.is_empty() {
                        // Browsers send an empty part for an untouched file input
                        continue;
                    }
                    form.files.push(PendingFile {
                        field: name,
                        file_name: Some(file_name),
                        content_type,
                        data: data.to_vec(),
                    });
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Files sent under the given field name.
    pub fn files_named(&self, name: &str) -> Vec<PendingFile> {
        self.files
            .iter()
            .filter(|f| f.field == name)
            .cloned()
            .collect()
    }
}
