//! Loan model and related types

use chrono::NaiveDate;

use super::book::Book;

/// Loan of one book to one customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    /// Assigned by the store on first insert
    pub id: Option<i64>,
    pub book: Book,
    pub customer: String,
    pub loan_date: NaiveDate,
    /// Outstanding until set to true
    pub returned: bool,
}

impl Loan {
    pub fn new(book: Book, customer: impl Into<String>, loan_date: NaiveDate) -> Self {
        Self {
            id: None,
            book,
            customer: customer.into(),
            loan_date,
            returned: false,
        }
    }

    pub fn is_outstanding(&self) -> bool {
        !self.returned
    }

    /// Outstanding and lent on or before `threshold`
    pub fn is_late(&self, threshold: NaiveDate) -> bool {
        self.is_outstanding() && self.loan_date <= threshold
    }
}

/// Loan search filter.
///
/// A loan matches when its book isbn equals `isbn` OR its customer equals
/// `customer`. An unset field never matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub isbn: Option<String>,
    pub customer: Option<String>,
}

impl LoanFilter {
    pub fn matches(&self, loan: &Loan) -> bool {
        self.isbn.as_deref() == Some(loan.book.isbn.as_str())
            || self.customer.as_deref() == Some(loan.customer.as_str())
    }
}
