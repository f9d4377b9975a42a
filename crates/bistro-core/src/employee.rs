//! # Employees
//!
//! Employees form a supervision tree: at most one supervisor each, any
//! number of subordinates, never a cycle. The tree edges are written only by
//! the registry's association manager.

use chrono::NaiveDate;
use serde::Serialize;
use std::hash::{Hash, Hasher};

use crate::association::LinkSet;
use crate::error::{CoreError, CoreResult};
use crate::types::EmployeeId;

/// A member of staff.
///
/// Identity is (employee id, hire date).
#[derive(Debug, Clone, Serialize)]
pub struct Employee {
    id: EmployeeId,
    hired_on: NaiveDate,
    left_on: Option<NaiveDate>,
    department: String,
    supervisor: Option<EmployeeId>,
    subordinates: LinkSet<EmployeeId>,
}

impl Employee {
    pub fn new(id: EmployeeId, hired_on: NaiveDate, department: impl Into<String>) -> Self {
        Employee {
            id,
            hired_on,
            left_on: None,
            department: department.into(),
            supervisor: None,
            subordinates: LinkSet::default(),
        }
    }

    pub fn with_leaving_date(mut self, left_on: NaiveDate) -> Self {
        self.left_on = Some(left_on);
        self
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn hired_on(&self) -> NaiveDate {
        self.hired_on
    }

    pub fn left_on(&self) -> Option<NaiveDate> {
        self.left_on
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn supervisor(&self) -> Option<EmployeeId> {
        self.supervisor
    }

    pub fn subordinates(&self) -> &LinkSet<EmployeeId> {
        &self.subordinates
    }

    /// Rejects a leaving date earlier than the hire date.
    pub fn check_dates(&self) -> CoreResult<()> {
        match self.left_on {
            Some(left) if left < self.hired_on => Err(CoreError::LeftBeforeHired {
                employee: self.id,
                hired: self.hired_on,
                left,
            }),
            _ => Ok(()),
        }
    }

    /// Days employed: hire date to leaving date, or to `as_of` while still
    /// employed. Never negative.
    ///
    /// ```rust
    /// use bistro_core::{Employee, EmployeeId};
    /// use chrono::NaiveDate;
    ///
    /// let hired = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    /// let e = Employee::new(EmployeeId::new(1), hired, "Kitchen");
    /// assert_eq!(e.employed_days(today), 30);
    /// ```
    pub fn employed_days(&self, as_of: NaiveDate) -> i64 {
        let end = self.left_on.unwrap_or(as_of);
        (end - self.hired_on).num_days().max(0)
    }

    pub(crate) fn set_supervisor(&mut self, supervisor: Option<EmployeeId>) {
        self.supervisor = supervisor;
    }

    pub(crate) fn subordinates_mut(&mut self) -> &mut LinkSet<EmployeeId> {
        &mut self.subordinates
    }
}

impl PartialEq for Employee {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.hired_on == other.hired_on
    }
}

impl Eq for Employee {}

impl Hash for Employee {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.hired_on.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_identity_includes_hire_date() {
        let a = Employee::new(EmployeeId::new(1), date(2023, 5, 1), "Kitchen");
        let b = Employee::new(EmployeeId::new(1), date(2023, 5, 1), "Floor");
        let c = Employee::new(EmployeeId::new(1), date(2024, 5, 1), "Kitchen");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_employed_days_uses_leaving_date() {
        let e = Employee::new(EmployeeId::new(1), date(2024, 1, 1), "Bar")
            .with_leaving_date(date(2024, 1, 11));
        assert_eq!(e.employed_days(date(2030, 1, 1)), 10);
    }

    #[test]
    fn test_leaving_before_hire_is_rejected() {
        let e = Employee::new(EmployeeId::new(4), date(2024, 3, 1), "Bar")
            .with_leaving_date(date(2024, 2, 1));
        assert!(matches!(e.check_dates(), Err(CoreError::LeftBeforeHired { .. })));
        assert_eq!(e.employed_days(date(2024, 6, 1)), 0);

        let same_day = Employee::new(EmployeeId::new(5), date(2024, 3, 1), "Bar")
            .with_leaving_date(date(2024, 3, 1));
        assert!(same_day.check_dates().is_ok());
    }
}
