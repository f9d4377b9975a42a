//! # Restaurants and Tables
//!
//! A restaurant owns its tables outright (bounded by `max_capacity`) and is
//! linked to menus through the restaurant↔menu association.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::association::LinkSet;
use crate::error::{CoreError, CoreResult};
use crate::types::{Outcome, TableId};

/// A dining table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub seats: u8,
}

impl Table {
    pub fn new(id: TableId, seats: u8) -> Self {
        Table { id, seats }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Table {}

impl Hash for Table {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A restaurant. Identity is (name, max capacity).
#[derive(Debug, Clone, Serialize)]
pub struct Restaurant {
    name: String,
    max_capacity: u32,
    tables: Vec<Table>,
    menus: LinkSet<String>,
}

impl Restaurant {
    pub fn new(name: impl Into<String>, max_capacity: u32) -> Self {
        Restaurant {
            name: name.into(),
            max_capacity,
            tables: Vec::new(),
            menus: LinkSet::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn number_of_tables(&self) -> usize {
        self.tables.len()
    }

    /// Names of the attached menus.
    pub fn menus(&self) -> &LinkSet<String> {
        &self.menus
    }

    /// Adds a table.
    ///
    /// ## Behavior
    /// - Full restaurant: `CapacityReached` error
    /// - Table id already present: `Outcome::DuplicateKey`, nothing replaced
    pub fn add_table(&mut self, table: Table) -> CoreResult<Outcome> {
        if self.tables.contains(&table) {
            return Ok(Outcome::DuplicateKey);
        }

        if self.tables.len() >= self.max_capacity as usize {
            return Err(CoreError::CapacityReached {
                restaurant: self.name.clone(),
                max: self.max_capacity,
            });
        }

        self.tables.push(table);
        Ok(Outcome::Applied)
    }

    pub fn remove_table(&mut self, id: TableId) -> Outcome {
        let initial_len = self.tables.len();
        self.tables.retain(|t| t.id != id);

        if self.tables.len() == initial_len {
            Outcome::NotFound
        } else {
            Outcome::Applied
        }
    }

    pub(crate) fn menus_mut(&mut self) -> &mut LinkSet<String> {
        &mut self.menus
    }
}

impl PartialEq for Restaurant {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.max_capacity == other.max_capacity
    }
}

impl Eq for Restaurant {}

impl Hash for Restaurant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.max_capacity.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_tables_bounded_by_capacity() {
        let mut r = Restaurant::new("Da Mario", 2);
        assert_eq!(r.add_table(Table::new(TableId::new(1), 4)).unwrap(), Outcome::Applied);
        assert_eq!(r.add_table(Table::new(TableId::new(2), 2)).unwrap(), Outcome::Applied);

        let err = r.add_table(Table::new(TableId::new(3), 6)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidState);
        assert_eq!(r.number_of_tables(), 2);
    }

    #[test]
    fn test_duplicate_table_reported() {
        let mut r = Restaurant::new("Da Mario", 5);
        r.add_table(Table::new(TableId::new(1), 4)).unwrap();
        assert_eq!(
            r.add_table(Table::new(TableId::new(1), 8)).unwrap(),
            Outcome::DuplicateKey
        );
        assert_eq!(r.tables()[0].seats, 4);
    }

    #[test]
    fn test_remove_table() {
        let mut r = Restaurant::new("Da Mario", 5);
        r.add_table(Table::new(TableId::new(1), 4)).unwrap();
        assert_eq!(r.remove_table(TableId::new(1)), Outcome::Applied);
        assert_eq!(r.remove_table(TableId::new(1)), Outcome::NotFound);
    }

    #[test]
    fn test_identity_is_name_and_capacity() {
        assert_eq!(Restaurant::new("A", 3), Restaurant::new("A", 3));
        assert_ne!(Restaurant::new("A", 3), Restaurant::new("A", 4));
    }
}
