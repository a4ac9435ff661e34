//! Loan management service

use chrono::{Duration, NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{Book, Loan, LoanFilter, Page, PageRequest},
    repository::{require_id, Repository},
};

/// Days after which an outstanding loan is late
pub const LATE_LOAN_DAYS: i64 = 4;

/// Current date used for new loans and overdue checks
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a loan; the book must not have an outstanding loan
    pub async fn save(&self, loan: &Loan) -> AppResult<Loan> {
        let book_id = require_id(loan.book.id, "Book")?;

        if self.repository.loans.exists_outstanding(book_id).await? {
            tracing::warn!(book_id, customer = %loan.customer, "Book already loaned");
            return Err(AppError::book_already_loaned());
        }

        let saved = self.repository.loans.insert(loan).await?;
        tracing::info!(id = ?saved.id, book_id, customer = %saved.customer, "Loan created");
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Loan>> {
        self.repository.loans.find_by_id(id).await
    }

    /// Persist the given state, typically to mark the loan returned
    pub async fn update(&self, loan: &Loan) -> AppResult<Loan> {
        require_id(loan.id, "Loan")?;
        let updated = self.repository.loans.update(loan).await?;
        tracing::info!(id = ?updated.id, returned = updated.returned, "Loan updated");
        Ok(updated)
    }

    /// Loans whose book isbn OR customer equals the filter
    pub async fn find(&self, filter: &LoanFilter, page: &PageRequest) -> AppResult<Page<Loan>> {
        self.repository
            .loans
            .find_by_isbn_or_customer(filter.isbn.as_deref(), filter.customer.as_deref(), page)
            .await
    }

    /// Every loan of the book, returned or not
    pub async fn get_loans_by_book(&self, book: &Book, page: &PageRequest) -> AppResult<Page<Loan>> {
        let book_id = require_id(book.id, "Book")?;
        self.repository.loans.find_by_book(book_id, page).await
    }

    pub async fn get_all_late_loans(&self) -> AppResult<Vec<Loan>> {
        self.late_loans_as_of(today()).await
    }

    /// Outstanding loans lent at least `LATE_LOAN_DAYS` before `today`
    pub async fn late_loans_as_of(&self, today: NaiveDate) -> AppResult<Vec<Loan>> {
        let threshold = today - Duration::days(LATE_LOAN_DAYS);
        self.repository.loans.find_overdue(threshold).await
    }
}
