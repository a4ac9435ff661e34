//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{loans::LoanDto, PaginatedResponse, QueryParams, ValidatedJson};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, PageRequest},
};

/// Book representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookDto {
    pub id: Option<i64>,
    pub title: String,
    pub autor: String,
    pub isbn: String,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            autor: book.autor,
            isbn: book.isbn,
        }
    }
}

/// Create or update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    #[validate(
        required(message = "Title must be provided"),
        length(min = 1, message = "Title must be provided")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "Author must be provided"),
        length(min = 1, message = "Author must be provided")
    )]
    pub autor: Option<String>,
    #[validate(
        required(message = "Isbn must be provided"),
        length(min = 1, message = "Isbn must be provided")
    )]
    pub isbn: Option<String>,
}

/// Book search parameters; every given field is a case-insensitive substring
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    pub title: Option<String>,
    pub autor: Option<String>,
    pub isbn: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Paging parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

async fn find_book(state: &crate::AppState, id: i64) -> AppResult<Book> {
    state
        .services
        .books
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookDto),
        (status = 400, description = "Invalid input or isbn already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> AppResult<(StatusCode, Json<BookDto>)> {
    let book = Book::new(
        request.title.unwrap_or_default(),
        request.autor.unwrap_or_default(),
        request.isbn.unwrap_or_default(),
    );
    tracing::info!(isbn = %book.isbn, "Creating book");

    let saved = state.services.books.save(&book).await?;
    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDto),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDto>> {
    let book = find_book(&state, id).await?;
    Ok(Json(book.into()))
}

/// Update title and author of a book; the isbn is not revised
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookDto),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> AppResult<Json<BookDto>> {
    tracing::info!(id, "Updating book");
    let mut book = find_book(&state, id).await?;
    book.title = request.title.unwrap_or_default();
    book.autor = request.autor.unwrap_or_default();

    let updated = state.services.books.update(&book).await?;
    Ok(Json(updated.into()))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Book has loans", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    tracing::info!(id, "Deleting book");
    let book = find_book(&state, id).await?;
    state.services.books.delete(&book).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Search books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = PaginatedResponse<BookDto>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    QueryParams(query): QueryParams<BookQuery>,
) -> AppResult<Json<PaginatedResponse<BookDto>>> {
    let filter = BookFilter {
        title: query.title,
        autor: query.autor,
        isbn: query.isbn,
    };
    let page_request = PageRequest::new(query.page, query.per_page);

    let page = state.services.books.find(&filter, &page_request).await?;
    Ok(Json(PaginatedResponse::from_page(page, &page_request)))
}

/// List every loan of a book
#[utoipa::path(
    get,
    path = "/books/{id}/loans",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Loans of the book", body = PaginatedResponse<LoanDto>),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_book_loans(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDto>>> {
    let book = find_book(&state, id).await?;
    let page_request = PageRequest::new(query.page, query.per_page);

    let page = state.services.loans.get_loans_by_book(&book, &page_request).await?;
    Ok(Json(PaginatedResponse::from_page(page, &page_request)))
}
