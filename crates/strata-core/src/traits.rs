//! Entity contracts shared by every persisted type.

use crate::{EntityId, StrataResult};
use chrono::NaiveDate;

/// Contract every persisted entity satisfies.
///
/// A transient entity has no identifier. Once persisted, both the identifier
/// and the creation date are always present; the creation date is set on
/// first persist and is not meant to change afterwards.
pub trait BaseEntity: Send + Sync {
    /// Returns the storage-assigned identifier, if any.
    fn id(&self) -> Option<EntityId>;

    /// Sets the identifier.
    fn set_id(&mut self, id: EntityId);

    /// Returns the creation date, if set.
    fn creation_date(&self) -> Option<NaiveDate>;

    /// Sets the creation date.
    fn set_creation_date(&mut self, date: NaiveDate);

    /// Whether the entity has never been persisted.
    fn is_transient(&self) -> bool {
        self.id().is_none()
    }

    /// Stamps the creation date with `today` unless one is already set.
    fn ensure_creation_date(&mut self, today: NaiveDate) {
        if self.creation_date().is_none() {
            self.set_creation_date(today);
        }
    }

    /// Checks field-level rules before the entity is written.
    fn validate_entity(&self) -> StrataResult<()> {
        Ok(())
    }
}
