//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Full book record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub book_id: String,
    pub section: String,
    pub author: String,
    pub content: String,
    pub edition: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book without its content, for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookShort {
    pub id: Uuid,
    pub title: String,
    pub book_id: String,
    pub section: String,
    pub author: String,
    pub edition: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookShort {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            book_id: book.book_id,
            section: book.section,
            author: book.author,
            edition: book.edition,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Create book request
///
/// `edition` is accepted either as a JSON number or a numeric string.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "bookId is required"))]
    pub book_id: String,
    #[validate(length(min = 1, message = "section is required"))]
    pub section: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[validate(range(min = 1, message = "edition must be a positive number"))]
    #[schema(value_type = i32)]
    pub edition: i32,
}

/// Append-to-content request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "bookId is required"))]
    pub book_id: String,
    /// Text appended to the book content
    #[validate(length(min = 1, message = "updation is required"))]
    pub updation: String,
}

/// Delete book request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteBook {
    pub title: Option<String>,
    #[validate(length(min = 1, message = "bookId is required"))]
    pub book_id: String,
}

/// Read book query parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase", default)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    #[validate(length(min = 1, message = "bookId is required"))]
    pub book_id: String,
}
