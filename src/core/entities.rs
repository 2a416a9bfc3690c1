use crate::core::normalize::{optional_integer, required_text, stored_integer, stored_text};
use crate::domain::model::{Column, Entity, FieldValue, RawCandidate, RejectReason};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Books,
    Users,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Books => Book::TABLE,
            EntityKind::Users => User::TABLE,
        }
    }

    pub fn has_sample_data(&self) -> bool {
        match self {
            EntityKind::Books => !Book::sample_candidates().is_empty(),
            EntityKind::Users => !User::sample_candidates().is_empty(),
        }
    }

    pub fn default_source(&self) -> &'static str {
        match self {
            EntityKind::Books => "demo",
            EntityKind::Users => "users.csv",
        }
    }

    pub fn default_store(&self) -> &'static str {
        match self {
            EntityKind::Books => "books.db",
            EntityKind::Users => "users.db",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub year: Option<i64>,
}

impl Entity for Book {
    const TABLE: &'static str = "books";
    const COLUMNS: &'static [Column] = &[
        Column::text("title"),
        Column::text("author"),
        Column::optional_integer("year"),
    ];
    const DEFAULT_KEY: &'static [&'static str] = &["title"];
    const DISPLAY_LIMIT: Option<usize> = None;

    fn normalize(raw: &RawCandidate) -> Result<Self, RejectReason> {
        Ok(Self {
            title: required_text(raw, "title")?,
            author: required_text(raw, "author")?,
            year: optional_integer(raw, "year")?,
        })
    }

    fn from_stored(raw: &RawCandidate) -> Self {
        Self {
            title: stored_text(raw, "title"),
            author: stored_text(raw, "author"),
            year: stored_integer(raw, "year"),
        }
    }

    fn value(&self, column: &str) -> FieldValue {
        match column {
            "title" => FieldValue::Text(self.title.clone()),
            "author" => FieldValue::Text(self.author.clone()),
            "year" => self.year.map_or(FieldValue::Null, FieldValue::Integer),
            _ => FieldValue::Null,
        }
    }

    fn sample_candidates() -> Vec<RawCandidate> {
        [
            ("The Great Gatsby", "F. Scott Fitzgerald", 1925),
            ("To Kill a Mockingbird", "Harper Lee", 1960),
            ("1984", "George Orwell", 1949),
            ("Pride and Prejudice", "Jane Austen", 1813),
            ("The Catcher in the Rye", "J.D. Salinger", 1951),
        ]
        .into_iter()
        .map(|(title, author, year)| {
            RawCandidate::new()
                .with("title", title)
                .with("author", author)
                .with("year", year)
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [Column] = &[Column::text("name"), Column::text("email")];
    const DEFAULT_KEY: &'static [&'static str] = &["email"];
    const DISPLAY_LIMIT: Option<usize> = Some(10);

    fn normalize(raw: &RawCandidate) -> Result<Self, RejectReason> {
        Ok(Self {
            name: required_text(raw, "name")?,
            email: required_text(raw, "email")?,
        })
    }

    fn from_stored(raw: &RawCandidate) -> Self {
        Self {
            name: stored_text(raw, "name"),
            email: stored_text(raw, "email"),
        }
    }

    fn value(&self, column: &str) -> FieldValue {
        match column {
            "name" => FieldValue::Text(self.name.clone()),
            "email" => FieldValue::Text(self.email.clone()),
            _ => FieldValue::Null,
        }
    }
}
