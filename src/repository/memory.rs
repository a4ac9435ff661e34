//! In-process store implementing both entity stores.
//!
//! Books and loans share one lock, so the uniqueness and exclusivity checks
//! run atomically with the insert that depends on them.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{require_id, BookStore, LoanStore};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Loan, LoanFilter, Page, PageRequest},
};

#[derive(Debug, Clone)]
struct StoredLoan {
    book_id: i64,
    customer: String,
    loan_date: NaiveDate,
    returned: bool,
}

#[derive(Debug, Default)]
struct State {
    books: BTreeMap<i64, Book>,
    loans: BTreeMap<i64, StoredLoan>,
    last_book_id: i64,
    last_loan_id: i64,
}

impl State {
    fn isbn_taken(&self, isbn: &str, except: Option<i64>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && b.id != except)
    }

    fn has_outstanding(&self, book_id: i64, except: Option<i64>) -> bool {
        self.loans
            .iter()
            .any(|(id, l)| l.book_id == book_id && !l.returned && Some(*id) != except)
    }

    fn loan(&self, id: i64, stored: &StoredLoan) -> AppResult<Loan> {
        let book = self.books.get(&stored.book_id).cloned().ok_or_else(|| {
            AppError::Internal(format!("Loan {} references missing book {}", id, stored.book_id))
        })?;
        Ok(Loan {
            id: Some(id),
            book,
            customer: stored.customer.clone(),
            loan_date: stored.loan_date,
            returned: stored.returned,
        })
    }

    fn loans_where(&self, pred: impl Fn(&Loan) -> bool) -> AppResult<Vec<Loan>> {
        let mut out = Vec::new();
        for (id, stored) in &self.loans {
            let loan = self.loan(*id, stored)?;
            if pred(&loan) {
                out.push(loan);
            }
        }
        Ok(out)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    fn lock(&self) -> AppResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("Memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut state = self.lock()?;
        if state.isbn_taken(&book.isbn, None) {
            return Err(AppError::duplicate_isbn());
        }
        state.last_book_id += 1;
        let id = state.last_book_id;
        let stored = Book {
            id: Some(id),
            ..book.clone()
        };
        state.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let id = require_id(book.id, "Book")?;
        let mut state = self.lock()?;
        if !state.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        if state.isbn_taken(&book.isbn, Some(id)) {
            return Err(AppError::duplicate_isbn());
        }
        state.books.insert(id, book.clone());
        Ok(book.clone())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut state = self.lock()?;
        if state.loans.values().any(|l| l.book_id == id) {
            return Err(AppError::book_has_loans());
        }
        state
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.lock()?.books.get(&id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        Ok(self.lock()?.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        Ok(self.lock()?.isbn_taken(isbn, None))
    }

    async fn search(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>> {
        let state = self.lock()?;
        let matches: Vec<Book> = state
            .books
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        Ok(page.slice(&matches))
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn insert(&self, loan: &Loan) -> AppResult<Loan> {
        let book_id = require_id(loan.book.id, "Book")?;
        let mut state = self.lock()?;
        if !state.books.contains_key(&book_id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }
        if !loan.returned && state.has_outstanding(book_id, None) {
            return Err(AppError::book_already_loaned());
        }
        state.last_loan_id += 1;
        let id = state.last_loan_id;
        let stored = StoredLoan {
            book_id,
            customer: loan.customer.clone(),
            loan_date: loan.loan_date,
            returned: loan.returned,
        };
        state.loans.insert(id, stored.clone());
        state.loan(id, &stored)
    }

    async fn update(&self, loan: &Loan) -> AppResult<Loan> {
        let id = require_id(loan.id, "Loan")?;
        let book_id = require_id(loan.book.id, "Book")?;
        let mut state = self.lock()?;
        if !state.loans.contains_key(&id) {
            return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
        }
        if !loan.returned && state.has_outstanding(book_id, Some(id)) {
            return Err(AppError::book_already_loaned());
        }
        let stored = StoredLoan {
            book_id,
            customer: loan.customer.clone(),
            loan_date: loan.loan_date,
            returned: loan.returned,
        };
        state.loans.insert(id, stored.clone());
        state.loan(id, &stored)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Loan>> {
        let state = self.lock()?;
        match state.loans.get(&id) {
            Some(stored) => state.loan(id, stored).map(Some),
            None => Ok(None),
        }
    }

    async fn exists_outstanding(&self, book_id: i64) -> AppResult<bool> {
        Ok(self.lock()?.has_outstanding(book_id, None))
    }

    async fn find_by_isbn_or_customer(
        &self,
        isbn: Option<&str>,
        customer: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<Page<Loan>> {
        let filter = LoanFilter {
            isbn: isbn.map(str::to_string),
            customer: customer.map(str::to_string),
        };
        let state = self.lock()?;
        let matches = state.loans_where(|l| filter.matches(l))?;
        Ok(page.slice(&matches))
    }

    async fn find_by_book(&self, book_id: i64, page: &PageRequest) -> AppResult<Page<Loan>> {
        let state = self.lock()?;
        let matches = state.loans_where(|l| l.book.id == Some(book_id))?;
        Ok(page.slice(&matches))
    }

    async fn find_overdue(&self, threshold: NaiveDate) -> AppResult<Vec<Loan>> {
        let state = self.lock()?;
        let mut late = state.loans_where(|l| l.is_late(threshold))?;
        late.sort_by_key(|l| (l.loan_date, l.id));
        Ok(late)
    }
}
