//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{map_constraint_violation, require_id, BookStore};
use crate::{
    error::{AppError, AppResult},
    models::{book::contains_pattern, Book, BookFilter, Page, PageRequest},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, autor, isbn)
            VALUES ($1, $2, $3)
            RETURNING id, title, autor, isbn
            "#,
        )
        .bind(&book.title)
        .bind(&book.autor)
        .bind(&book.isbn)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_violation)
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let id = require_id(book.id, "Book")?;

        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET title = $1, autor = $2, isbn = $3
            WHERE id = $4
            RETURNING id, title, autor, isbn
            "#,
        )
        .bind(&book.title)
        .bind(&book.autor)
        .bind(&book.isbn)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_constraint_violation)?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_constraint_violation)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, title, autor, isbn FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, title, autor, isbn FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn search(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>> {
        let criteria = filter.criteria();

        let conditions: Vec<String> = criteria
            .iter()
            .enumerate()
            .map(|(i, (field, _))| format!("LOWER({}) LIKE ${}", field.column(), i + 1))
            .collect();
        let params: Vec<String> = criteria
            .iter()
            .map(|(_, needle)| contains_pattern(needle))
            .collect();

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT id, title, autor, isbn
            FROM books
            {}
            ORDER BY id
            LIMIT {} OFFSET {}
            "#,
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let items = select_builder.fetch_all(&self.pool).await?;

        Ok(Page { items, total })
    }
}
