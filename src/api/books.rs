//! Book catalog endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookShort, CreateBook, DeleteBook, UpdateBook},
    AppState,
};

use super::{users::MessageResponse, AdminUser, AuthenticatedUser};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadBookResponse {
    pub is_book: Book,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BooksResponse {
    pub books: Vec<BookShort>,
}

/// Book mutation acknowledgement carrying the stored record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub message: String,
    pub book: Book,
}

/// Get a single book, content included
#[utoipa::path(
    get,
    path = "/user/library-main/read-book",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Book found", body = ReadBookResponse),
        (status = 400, description = "bookId missing", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn read_book(
    State(state): State<AppState>,
    AuthenticatedUser(_reader): AuthenticatedUser,
    WithRejection(Query(query), _): WithRejection<Query<BookQuery>, AppError>,
) -> AppResult<Json<ReadBookResponse>> {
    let book = state.services.books.read_book(query).await?;
    Ok(Json(ReadBookResponse { is_book: book }))
}

/// List the catalog without book contents
#[utoipa::path(
    get,
    path = "/user/library-main/get-all-books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All books ordered by title", body = BooksResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_all_books(
    State(state): State<AppState>,
    AuthenticatedUser(_reader): AuthenticatedUser,
) -> AppResult<Json<BooksResponse>> {
    let books = state.services.books.list_books().await?;
    Ok(Json(BooksResponse { books }))
}

/// Add a book to the catalog (admin only)
#[utoipa::path(
    post,
    path = "/user/library-main/add-book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin privileges required", body = crate::error::ErrorResponse),
        (status = 409, description = "bookId or title already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    WithRejection(Json(book), _): WithRejection<Json<CreateBook>, AppError>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let book = state.services.books.add_book(book).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            message: "Book created successfully!".to_string(),
            book,
        }),
    ))
}

/// Append text to a book's content (admin only)
#[utoipa::path(
    put,
    path = "/user/library-main/update-book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Content appended", body = BookResponse),
        (status = 400, description = "bookId or updation missing", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    WithRejection(Json(update), _): WithRejection<Json<UpdateBook>, AppError>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.books.update_book(update).await?;

    Ok(Json(BookResponse {
        message: "Book Updated Successfully!".to_string(),
        book,
    }))
}

/// Remove a book from the catalog (admin only)
#[utoipa::path(
    delete,
    path = "/user/library-main/delete-book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = DeleteBook,
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 400, description = "bookId missing", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    WithRejection(Json(request), _): WithRejection<Json<DeleteBook>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.delete_book(request).await?;

    Ok(Json(MessageResponse {
        message: "Book deleted Successfully!".to_string(),
    }))
}
