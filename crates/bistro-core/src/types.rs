//! # Shared Domain Types
//!
//! Business keys, enumerations and operation outcomes used by every entity
//! module.
//!
//! ## Business Keys
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Business Keys                                   │
//! │                                                                         │
//! │  CustomerId  OrderId  PaymentId  ReservationId  EmployeeId  DishId     │
//! │  TableId  ValetId                                                      │
//! │                                                                         │
//! │  • Positive integers (0 is never a valid key)                          │
//! │  • Copy types: back-references are keys, never owning pointers         │
//! │  • Menus and restaurants are keyed by name                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::{validate_id, ValidationResult};

// =============================================================================
// Business Key Newtypes
// =============================================================================

macro_rules! business_key {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps an already-validated raw key.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                $name(raw)
            }

            /// Validates untrusted input (must be a positive integer).
            pub fn parse(raw: i64) -> ValidationResult<Self> {
                validate_id($field, raw).map($name)
            }

            #[inline]
            pub const fn get(&self) -> u32 {
                self.0
            }

            /// The key after this one, or `None` past `u32::MAX`.
            #[inline]
            pub const fn checked_next(&self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(raw) => Some($name(raw)),
                    None => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

business_key!(
    /// Customer business key.
    CustomerId,
    "customer id"
);
business_key!(
    /// Order business key.
    OrderId,
    "order id"
);
business_key!(
    /// Payment business key.
    PaymentId,
    "payment id"
);
business_key!(
    /// Reservation key, qualified by the owning customer.
    ReservationId,
    "reservation id"
);
business_key!(
    /// Employee number (identity also includes the hire date).
    EmployeeId,
    "employee id"
);
business_key!(DishId, "dish id");
business_key!(TableId, "table id");
business_key!(ValetId, "valet id");

// =============================================================================
// Entity Kind
// =============================================================================

/// Names an entity type in errors and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Order,
    Payment,
    Reservation,
    Employee,
    Restaurant,
    Menu,
    Table,
    Dish,
    Valet,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Customer => "Customer",
            EntityKind::Order => "Order",
            EntityKind::Payment => "Payment",
            EntityKind::Reservation => "Reservation",
            EntityKind::Employee => "Employee",
            EntityKind::Restaurant => "Restaurant",
            EntityKind::Menu => "Menu",
            EntityKind::Table => "Table",
            EntityKind::Dish => "Dish",
            EntityKind::Valet => "Valet",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Credit or debit card.
    Card,
    /// Phone wallet / mobile transfer.
    Mobile,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Mobile => write!(f, "mobile"),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment lifecycle.
///
/// ```text
///   Pending ──process()──► Completed ──refund()──► Refunded
/// ```
/// No transition leaves `Refunded` or re-enters `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of a command that may legitimately do nothing.
///
/// `NotFound` and `DuplicateKey` are reported conditions, not failures:
/// the operation left the model untouched and the caller decides whether
/// that matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The model changed.
    Applied,
    /// The requested state was already in place.
    Unchanged,
    /// The referenced member is not in the target collection.
    NotFound,
    /// The key is already taken in the target collection.
    DuplicateKey,
}

impl Outcome {
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
