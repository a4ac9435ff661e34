//! Book catalog service

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Page, PageRequest},
    repository::{require_id, Repository},
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a new book; the isbn must not be in use
    pub async fn save(&self, book: &Book) -> AppResult<Book> {
        if self.repository.books.exists_by_isbn(&book.isbn).await? {
            tracing::warn!(isbn = %book.isbn, "Rejected book with duplicate isbn");
            return Err(AppError::duplicate_isbn());
        }

        let saved = self.repository.books.insert(book).await?;
        tracing::info!(id = ?saved.id, isbn = %saved.isbn, "Book created");
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        self.repository.books.find_by_id(id).await
    }

    /// Persist the given state as is; the caller supplies every field
    pub async fn update(&self, book: &Book) -> AppResult<Book> {
        require_id(book.id, "Book")?;
        self.repository.books.update(book).await
    }

    pub async fn delete(&self, book: &Book) -> AppResult<()> {
        let id = require_id(book.id, "Book")?;
        self.repository.books.delete(id).await?;
        tracing::info!(id, "Book deleted");
        Ok(())
    }

    pub async fn find(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>> {
        self.repository.books.search(filter, page).await
    }

    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.repository.books.find_by_isbn(isbn).await
    }

    /// Round trip to the book store
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.exists_by_isbn("").await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusinessRule;
    use tokio_test::{assert_err, assert_ok};

    fn service() -> BooksService {
        BooksService::new(Repository::in_memory())
    }

    fn titulo() -> Book {
        Book::new("Titulo", "Autor", "123456789")
    }

    #[tokio::test]
    async fn save_assigns_id() {
        let service = service();
        let saved = service.save(&titulo()).await.unwrap();

        assert!(saved.id.is_some());
        assert_eq!(saved.title, "Titulo");
        assert_eq!(saved.autor, "Autor");
        assert_eq!(saved.isbn, "123456789");
    }

    #[tokio::test]
    async fn save_rejects_duplicate_isbn() {
        let service = service();
        service.save(&titulo()).await.unwrap();

        let err = service
            .save(&Book::new("Outro", "Outro Autor", "123456789"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(BusinessRule::DuplicateIsbn)));
    }

    #[tokio::test]
    async fn get_by_id_missing_is_none() {
        assert_eq!(service().get_by_id(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_and_delete_require_id() {
        let service = service();
        assert!(matches!(
            service.update(&titulo()).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.delete(&titulo()).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn update_persists_given_state() {
        let service = service();
        let saved = service.save(&titulo()).await.unwrap();

        let changed = Book {
            title: "Novo titulo".to_string(),
            autor: "Novo autor".to_string(),
            ..saved.clone()
        };
        assert_ok!(service.update(&changed).await);

        let fetched = service.get_by_id(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(fetched, changed);
    }

    #[tokio::test]
    async fn delete_removes_book() {
        let service = service();
        let saved = service.save(&titulo()).await.unwrap();

        assert_ok!(service.delete(&saved).await);
        assert_eq!(service.get_by_id(saved.id.unwrap()).await.unwrap(), None);
        assert_err!(service.delete(&saved).await);
    }

    #[tokio::test]
    async fn find_matches_substrings_ignoring_case() {
        let service = service();
        service.save(&titulo()).await.unwrap();
        service.save(&Book::new("Outro livro", "Fulano", "987654321")).await.unwrap();

        let filter = BookFilter {
            title: Some("titu".to_string()),
            ..Default::default()
        };
        let page = service.find(&filter, &PageRequest::new(Some(1), Some(10))).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Titulo");

        let all = service.find(&BookFilter::default(), &PageRequest::default()).await.unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn get_by_isbn_is_exact() {
        let service = service();
        service.save(&titulo()).await.unwrap();

        assert!(service.get_by_isbn("123456789").await.unwrap().is_some());
        assert!(service.get_by_isbn("12345").await.unwrap().is_none());
    }
}
