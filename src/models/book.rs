//! Book model and the example-style filter used to search the catalog

use sqlx::FromRow;

/// Book as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Book {
    /// Assigned by the store on first insert
    pub id: Option<i64>,
    pub title: String,
    pub autor: String,
    pub isbn: String,
}

impl Book {
    pub fn new(title: impl Into<String>, autor: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            autor: autor.into(),
            isbn: isbn.into(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Searchable book attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Autor,
    Isbn,
}

impl BookField {
    pub fn column(self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Autor => "autor",
            BookField::Isbn => "isbn",
        }
    }

    pub fn value(self, book: &Book) -> &str {
        match self {
            BookField::Title => &book.title,
            BookField::Autor => &book.autor,
            BookField::Isbn => &book.isbn,
        }
    }
}

/// Book search filter.
///
/// Every populated field must be contained, ignoring case, in the matching
/// attribute of the book. Unset fields impose no constraint, so the default
/// filter matches the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub autor: Option<String>,
    pub isbn: Option<String>,
}

impl BookFilter {
    /// Populated constraints as `(field, lowercase needle)` pairs
    pub fn criteria(&self) -> Vec<(BookField, String)> {
        [
            (BookField::Title, &self.title),
            (BookField::Autor, &self.autor),
            (BookField::Isbn, &self.isbn),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_ref().map(|v| (field, v.to_lowercase())))
        .collect()
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.criteria()
            .iter()
            .all(|(field, needle)| field.value(book).to_lowercase().contains(needle.as_str()))
    }
}

/// `LIKE` pattern for a substring match, with wildcards in the needle escaped
pub fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
