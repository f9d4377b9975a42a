//! # Error Types
//!
//! Domain-specific error types for bistro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bistro-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  console app errors                                                    │
//! │  └── AppError         - Config, I/O, wrapped CoreError                 │
//! │                                                                         │
//! │  Every CoreError maps onto one ErrorCategory:                          │
//! │    InvalidArgument · InvalidState · NotFound · Cycle · DuplicateKey    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation
//! - Structural violations (invalid arguments, cycles) abort before any
//!   mutation.
//! - Payment transition failures come back as `Err` so callers can react.
//! - "Not found" on removals and "duplicate key" on keyed adds are NOT errors;
//!   they are reported through [`Outcome`](crate::types::Outcome).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    CustomerId, DishId, EmployeeId, EntityKind, OrderId, PaymentId, PaymentStatus, ValetId,
};

// =============================================================================
// Error Category
// =============================================================================

/// Coarse classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Missing or malformed input.
    InvalidArgument,
    /// Operation not valid for the entity's current state.
    InvalidState,
    /// Referenced member missing from the target collection.
    NotFound,
    /// Supervisor assignment would create a cycle.
    Cycle,
    /// Key collision.
    DuplicateKey,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation referenced an entity that was never registered.
    #[error("Unknown {kind}: {id}")]
    UnknownEntity { kind: EntityKind, id: String },

    /// An entity with the same key is already registered.
    #[error("{kind} {id} is already registered")]
    DuplicateEntity { kind: EntityKind, id: String },

    /// Orders need at least one dish.
    #[error("At least one dish must be ordered")]
    EmptyOrder,

    /// Merging quantities would overflow the line-item counter.
    #[error("Quantity for dish {dish_id} would overflow ({current} + {added})")]
    QuantityOverflow {
        dish_id: DishId,
        current: u32,
        added: u32,
    },

    /// The order total would leave the representable cent range.
    #[error("Total of order {order_id} would overflow")]
    TotalOverflow { order_id: OrderId },

    /// Every key of this kind is taken.
    #[error("No free {kind} key left")]
    KeysExhausted { kind: EntityKind },

    /// Valet service needs a car on file.
    #[error("Customer {customer} has no car on file")]
    NoCar { customer: CustomerId },

    /// The car is already parked by a different valet.
    #[error("Car of customer {customer} is already with valet {valet}")]
    CarWithAnotherValet { customer: CustomerId, valet: ValetId },

    /// Leaving date precedes the hire date.
    #[error("Employee {employee} cannot leave on {left} before being hired on {hired}")]
    LeftBeforeHired {
        employee: EmployeeId,
        hired: NaiveDate,
        left: NaiveDate,
    },

    /// Tried to take more units off a line item than it holds.
    ///
    /// ## When This Occurs
    /// ```text
    /// Line: Pasta × 2
    ///      │
    ///      ▼
    /// reduce_item(Pasta, 3)
    ///      │
    ///      ▼
    /// InsufficientQuantity { available: 2, requested: 3 }
    /// ```
    #[error("Cannot remove {requested} of dish {dish_id}: only {available} in order")]
    InsufficientQuantity {
        dish_id: DishId,
        available: u32,
        requested: u32,
    },

    /// A quantity update referenced a dish that has no line item.
    #[error("Dish {dish_id} is not part of order {order_id}")]
    ItemNotInOrder { order_id: OrderId, dish_id: DishId },

    /// Payment state machine rejected a transition.
    ///
    /// ## When This Occurs
    /// - `process()` on a Completed or Refunded payment
    /// - `refund()` on a Pending or Refunded payment
    #[error("Payment {payment_id} is {status}, cannot {operation}")]
    InvalidPaymentTransition {
        payment_id: PaymentId,
        status: PaymentStatus,
        operation: &'static str,
    },

    /// The order already carries a payment that left `Pending`.
    #[error("Order {order_id} already has payment {payment_id} ({status})")]
    OrderAlreadyPaid {
        order_id: OrderId,
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    /// Restaurant table list is full.
    #[error("Cannot add more tables to '{restaurant}': max capacity of {max} reached")]
    CapacityReached { restaurant: String, max: u32 },

    /// Supervisor assignment would make an employee its own ancestor.
    #[error("Employee {supervisor} cannot supervise {employee}: would create a cycle")]
    SupervisorCycle {
        employee: EmployeeId,
        supervisor: EmployeeId,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for [`CoreError::UnknownEntity`].
    pub fn unknown(kind: EntityKind, id: impl ToString) -> Self {
        CoreError::UnknownEntity {
            kind,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`CoreError::DuplicateEntity`].
    pub fn duplicate(kind: EntityKind, id: impl ToString) -> Self {
        CoreError::DuplicateEntity {
            kind,
            id: id.to_string(),
        }
    }

    /// Maps the error onto the domain error taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::UnknownEntity { .. }
            | CoreError::EmptyOrder
            | CoreError::QuantityOverflow { .. }
            | CoreError::TotalOverflow { .. }
            | CoreError::LeftBeforeHired { .. }
            | CoreError::InsufficientQuantity { .. }
            | CoreError::Validation(_) => ErrorCategory::InvalidArgument,
            CoreError::InvalidPaymentTransition { .. }
            | CoreError::OrderAlreadyPaid { .. }
            | CoreError::CapacityReached { .. }
            | CoreError::KeysExhausted { .. }
            | CoreError::NoCar { .. }
            | CoreError::CarWithAnotherValet { .. } => ErrorCategory::InvalidState,
            CoreError::ItemNotInOrder { .. } => ErrorCategory::NotFound,
            CoreError::SupervisorCycle { .. } => ErrorCategory::Cycle,
            CoreError::DuplicateEntity { .. } => ErrorCategory::DuplicateKey,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientQuantity {
            dish_id: DishId::new(4),
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Cannot remove 3 of dish 4: only 2 in order"
        );

        let err = CoreError::unknown(EntityKind::Customer, 9);
        assert_eq!(err.to_string(), "Unknown Customer: 9");

        let err = CoreError::InvalidPaymentTransition {
            payment_id: PaymentId::new(1),
            status: PaymentStatus::Refunded,
            operation: "process",
        };
        assert_eq!(err.to_string(), "Payment 1 is refunded, cannot process");
    }

    #[test]
    fn test_categories() {
        assert_eq!(CoreError::EmptyOrder.category(), ErrorCategory::InvalidArgument);
        assert_eq!(
            CoreError::SupervisorCycle {
                employee: EmployeeId::new(1),
                supervisor: EmployeeId::new(2),
            }
            .category(),
            ErrorCategory::Cycle
        );
        assert_eq!(
            CoreError::OrderAlreadyPaid {
                order_id: OrderId::new(1),
                payment_id: PaymentId::new(1),
                status: PaymentStatus::Completed,
            }
            .category(),
            ErrorCategory::InvalidState
        );
        assert_eq!(
            CoreError::duplicate(EntityKind::Menu, "Lunch").category(),
            ErrorCategory::DuplicateKey
        );
        assert_eq!(
            CoreError::NoCar {
                customer: CustomerId::new(3)
            }
            .category(),
            ErrorCategory::InvalidState
        );
        assert_eq!(
            CoreError::TotalOverflow {
                order_id: OrderId::new(1)
            }
            .category(),
            ErrorCategory::InvalidArgument
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.category(), ErrorCategory::InvalidArgument);
    }
}
