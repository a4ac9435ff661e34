//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Loan, Page, PageRequest},
};

/// Unique index on `books.isbn`
pub const BOOKS_ISBN_UNIQUE: &str = "books_isbn_key";
/// Unique partial index: one outstanding loan per book
pub const LOANS_OUTSTANDING_UNIQUE: &str = "loans_one_outstanding_per_book";
/// Foreign key from `loans.book_id` to `books.id`
pub const LOANS_BOOK_FK: &str = "loans_book_id_fkey";

/// Book persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book, failing with the duplicate-isbn rule on conflict
    async fn insert(&self, book: &Book) -> AppResult<Book>;
    async fn update(&self, book: &Book) -> AppResult<Book>;
    async fn delete(&self, id: i64) -> AppResult<()>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;
    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;
    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool>;
    async fn search(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>>;
}

/// Loan persistence
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Insert a new loan, failing with the already-loaned rule when the book
    /// has an outstanding loan
    async fn insert(&self, loan: &Loan) -> AppResult<Loan>;
    async fn update(&self, loan: &Loan) -> AppResult<Loan>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Loan>>;
    async fn exists_outstanding(&self, book_id: i64) -> AppResult<bool>;
    async fn find_by_isbn_or_customer(
        &self,
        isbn: Option<&str>,
        customer: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<Page<Loan>>;
    async fn find_by_book(&self, book_id: i64, page: &PageRequest) -> AppResult<Page<Loan>>;
    /// Outstanding loans lent on or before `threshold`
    async fn find_overdue(&self, threshold: NaiveDate) -> AppResult<Vec<Loan>>;
}

/// Main repository struct holding the entity stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub loans: Arc<dyn LoanStore>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            loans: Arc::new(loans::LoansRepository::new(pool)),
        }
    }

    /// Create a repository backed by process memory
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            books: Arc::new(store.clone()),
            loans: Arc::new(store),
        }
    }
}

/// Translate violations of the catalog constraints into business errors
pub(crate) fn map_constraint_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        match db.constraint() {
            Some(BOOKS_ISBN_UNIQUE) => return AppError::duplicate_isbn(),
            Some(LOANS_OUTSTANDING_UNIQUE) => return AppError::book_already_loaned(),
            Some(LOANS_BOOK_FK) => return AppError::book_has_loans(),
            _ => {}
        }
    }
    AppError::Database(err)
}

pub(crate) fn require_id(id: Option<i64>, what: &str) -> AppResult<i64> {
    id.ok_or_else(|| AppError::InvalidArgument(format!("{} id cant be null.", what)))
}
