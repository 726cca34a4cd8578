//! Book entity.

use crate::{rules, BaseEntity, EntityId, StrataResult, ValidateExt};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A book in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Book {
    /// Storage-assigned identifier; `None` while transient.
    pub id: Option<EntityId>,

    /// Book title.
    #[validate(length(max = 255), custom(function = "rules::not_blank"))]
    pub title: String,

    /// Date the book was first persisted.
    pub creation_date: Option<NaiveDate>,
}

impl Book {
    /// Creates a new transient book.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            creation_date: None,
        }
    }

    /// Creates a book that carries an explicit identifier.
    #[must_use]
    pub fn with_id(id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            ..Self::new(title)
        }
    }

    /// Changes the title.
    pub fn retitle(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl BaseEntity for Book {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn creation_date(&self) -> Option<NaiveDate> {
        self.creation_date
    }

    fn set_creation_date(&mut self, date: NaiveDate) {
        self.creation_date = Some(date);
    }

    fn validate_entity(&self) -> StrataResult<()> {
        self.validate_fields()
    }
}
