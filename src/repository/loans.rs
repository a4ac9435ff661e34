//! Loans repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, Pool, Postgres};

use super::{map_constraint_violation, require_id, LoanStore};
use crate::{
    error::{AppError, AppResult},
    models::{Book, Loan, Page, PageRequest},
};

const LOAN_SELECT: &str = r#"
    SELECT l.id, l.customer, l.loan_date, l.returned,
           b.id AS book_id, b.title, b.autor, b.isbn
    FROM loans l
    JOIN books b ON b.id = l.book_id
"#;

/// Loan row joined with its book
#[derive(Debug, FromRow)]
struct LoanRow {
    id: i64,
    customer: String,
    loan_date: NaiveDate,
    returned: bool,
    book_id: i64,
    title: String,
    autor: String,
    isbn: String,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Loan {
            id: Some(row.id),
            book: Book {
                id: Some(row.book_id),
                title: row.title,
                autor: row.autor,
                isbn: row.isbn,
            },
            customer: row.customer,
            loan_date: row.loan_date,
            returned: row.returned,
        }
    }
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for LoansRepository {
    async fn insert(&self, loan: &Loan) -> AppResult<Loan> {
        let book_id = require_id(loan.book.id, "Book")?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO loans (book_id, customer, loan_date, returned)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(&loan.customer)
        .bind(loan.loan_date)
        .bind(loan.returned)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_violation)?;

        Ok(Loan {
            id: Some(id),
            ..loan.clone()
        })
    }

    async fn update(&self, loan: &Loan) -> AppResult<Loan> {
        let id = require_id(loan.id, "Loan")?;
        let book_id = require_id(loan.book.id, "Book")?;

        let result = sqlx::query(
            r#"
            UPDATE loans SET book_id = $1, customer = $2, loan_date = $3, returned = $4
            WHERE id = $5
            "#,
        )
        .bind(book_id)
        .bind(&loan.customer)
        .bind(loan.loan_date)
        .bind(loan.returned)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_constraint_violation)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
        }
        Ok(loan.clone())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Loan>> {
        let row = sqlx::query_as::<_, LoanRow>(&format!("{} WHERE l.id = $1", LOAN_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Loan::from))
    }

    async fn exists_outstanding(&self, book_id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND NOT returned)",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_by_isbn_or_customer(
        &self,
        isbn: Option<&str>,
        customer: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<Page<Loan>> {
        // NULL never compares equal, so an unset side matches nothing
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans l
            JOIN books b ON b.id = l.book_id
            WHERE b.isbn = $1 OR l.customer = $2
            "#,
        )
        .bind(isbn)
        .bind(customer)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE b.isbn = $1 OR l.customer = $2 ORDER BY l.id LIMIT {} OFFSET {}",
            LOAN_SELECT,
            page.per_page,
            page.offset()
        ))
        .bind(isbn)
        .bind(customer)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: rows.into_iter().map(Loan::from).collect(),
            total,
        })
    }

    async fn find_by_book(&self, book_id: i64, page: &PageRequest) -> AppResult<Page<Loan>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.book_id = $1 ORDER BY l.id LIMIT {} OFFSET {}",
            LOAN_SELECT,
            page.per_page,
            page.offset()
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: rows.into_iter().map(Loan::from).collect(),
            total,
        })
    }

    async fn find_overdue(&self, threshold: NaiveDate) -> AppResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.loan_date <= $1 AND NOT l.returned ORDER BY l.loan_date, l.id",
            LOAN_SELECT
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Loan::from).collect())
    }
}
