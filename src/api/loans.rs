//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{books::BookDto, PaginatedResponse, QueryParams, ValidatedJson};
use crate::{
    error::{AppError, AppResult},
    models::{Loan, LoanFilter, PageRequest},
    services::loans::today,
};

/// Borrow request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoanRequest {
    /// Isbn of the book to borrow
    #[validate(
        required(message = "Isbn must be provided"),
        length(min = 1, message = "Isbn must be provided")
    )]
    pub isbn: Option<String>,
    /// Borrower
    #[validate(
        required(message = "Customer must be provided"),
        length(min = 1, message = "Customer must be provided")
    )]
    pub customer: Option<String>,
}

/// Return (or reopen) flag for a loan
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReturnedLoanRequest {
    pub returned: bool,
}

/// Identifier of a created loan
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanCreated {
    pub id: i64,
}

/// Loan representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanDto {
    pub id: Option<i64>,
    pub isbn: String,
    pub customer: String,
    pub loan_date: NaiveDate,
    pub returned: bool,
    pub book: BookDto,
}

impl From<Loan> for LoanDto {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id,
            isbn: loan.book.isbn.clone(),
            customer: loan.customer,
            loan_date: loan.loan_date,
            returned: loan.returned,
            book: loan.book.into(),
        }
    }
}

/// Loan search parameters: isbn OR customer
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    pub isbn: Option<String>,
    pub customer: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = LoanRequest,
    responses(
        (status = 201, description = "Loan created", body = LoanCreated),
        (status = 400, description = "Unknown isbn, invalid input or book already loaned", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<LoanRequest>,
) -> AppResult<(StatusCode, Json<LoanCreated>)> {
    let isbn = request.isbn.unwrap_or_default();
    let book = state
        .services
        .books
        .get_by_isbn(&isbn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Book not found for passed isbn".to_string()))?;

    let loan = Loan::new(book, request.customer.unwrap_or_default(), today());
    let saved = state.services.loans.save(&loan).await?;

    let id = saved
        .id
        .ok_or_else(|| AppError::Internal("Stored loan has no id".to_string()))?;
    Ok((StatusCode::CREATED, Json(LoanCreated { id })))
}

/// Set the returned flag of a loan
#[utoipa::path(
    patch,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    request_body = ReturnedLoanRequest,
    responses(
        (status = 200, description = "Loan updated", body = LoanDto),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<ReturnedLoanRequest>,
) -> AppResult<Json<LoanDto>> {
    let mut loan = state
        .services
        .loans
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

    loan.returned = request.returned;
    let updated = state.services.loans.update(&loan).await?;
    Ok(Json(updated.into()))
}

/// Search loans by isbn or customer
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Matching loans", body = PaginatedResponse<LoanDto>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    QueryParams(query): QueryParams<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDto>>> {
    let filter = LoanFilter {
        isbn: query.isbn,
        customer: query.customer,
    };
    let page_request = PageRequest::new(query.page, query.per_page);

    let page = state.services.loans.find(&filter, &page_request).await?;
    Ok(Json(PaginatedResponse::from_page(page, &page_request)))
}
