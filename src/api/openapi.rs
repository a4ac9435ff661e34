//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "1.0.0",
        description = "Book catalog and loan management REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Books
        books::create_book,
        books::get_book,
        books::update_book,
        books::delete_book,
        books::list_books,
        books::list_book_loans,
        // Loans
        loans::create_loan,
        loans::return_book,
        loans::list_loans,
    ),
    components(
        schemas(
            books::BookDto,
            books::BookRequest,
            loans::LoanDto,
            loans::LoanRequest,
            loans::ReturnedLoanRequest,
            loans::LoanCreated,
            health::HealthResponse,
            crate::config::StorageBackend,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "loans", description = "Loan management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
