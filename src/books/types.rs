// Book and borrow models, plus the form payloads accepted from the browser

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Allowed borrow durations in days
pub const BORROW_DAY_OPTIONS: [u32; 3] = [7, 14, 30];

/// Default borrow duration in days
pub const DEFAULT_BORROW_DAYS: u32 = 7;

// ==================================================================================================
// Remote API models
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Book {
    /// A book record is usable only with an id, a title and an author
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.title.is_empty() && !self.author.is_empty()
    }
}

/// Payload for creating a book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: String,
    pub book_id: String,
    pub username: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrow_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrow_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub book_id: String,
    pub username: String,
    pub borrow_days: u32,
    pub borrow_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub id: String,
    pub book_id: String,
    pub username: String,
}

/// Result of a book creation the remote API accepted
#[derive(Debug, Clone, Serialize)]
pub struct CreatedBook {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<serde_json::Value>,
}

// ==================================================================================================
// Browser form payloads
// ==================================================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddBookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl AddBookForm {
    pub fn validate(self) -> Result<NewBook, ApiError> {
        let title = self.title.trim().to_string();
        let author = self.author.trim().to_string();
        if title.is_empty() || author.is_empty() {
            return Err(ApiError::ValidationError(
                "Title and Author are required fields".to_string(),
            ));
        }

        let rating = self.rating.unwrap_or(0.0);
        if !(0.0..=5.0).contains(&rating) {
            return Err(ApiError::ValidationError(
                "Rating must be between 0 and 5".to_string(),
            ));
        }

        Ok(NewBook {
            title,
            author,
            genre: self.genre.trim().to_string(),
            published_year: self.published_year.unwrap_or(0),
            rating,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowForm {
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub borrow_days: Option<u32>,
}

impl BorrowForm {
    /// Check the form and return `(book_id, username, days)`
    pub fn validate(&self) -> Result<(String, String, u32), ApiError> {
        let book_id = self.book_id.trim();
        if book_id.is_empty() {
            return Err(ApiError::ValidationError(
                "Please select a book first".to_string(),
            ));
        }
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ApiError::ValidationError(
                "Please enter your username".to_string(),
            ));
        }
        let days = self.borrow_days.unwrap_or(DEFAULT_BORROW_DAYS);
        if !BORROW_DAY_OPTIONS.contains(&days) {
            return Err(ApiError::ValidationError(format!(
                "Borrow duration must be one of {:?} days",
                BORROW_DAY_OPTIONS
            )));
        }
        Ok((book_id.to_string(), username.to_string(), days))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub username: String,
}

impl ReturnForm {
    pub fn validate(self) -> Result<ReturnRequest, ApiError> {
        let id = self.id.trim().to_string();
        let book_id = self.book_id.trim().to_string();
        let username = self.username.trim().to_string();
        if id.is_empty() || book_id.is_empty() || username.is_empty() {
            return Err(ApiError::ValidationError("Please fill all fields".to_string()));
        }
        Ok(ReturnRequest {
            id,
            book_id,
            username,
        })
    }
}
