//! # Validation Module
//!
//! Field rules applied by callers before constructing entities.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (console app, future UI)                              │
//! │  ├── Parses raw input                                                   │
//! │  └── THIS MODULE: ids, names, capacities, party sizes                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Core commands                                                 │
//! │  ├── Quantities 1..=999, prices 0..=$1M (add_item, set_item_quantity)  │
//! │  └── Payment amount > 0 (Payment::new)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bistro_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("restaurant name", "Trattoria", 2, 100).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a business key: positive and representable as `u32`.
///
/// ```rust
/// use bistro_core::validation::validate_id;
///
/// assert_eq!(validate_id("customer id", 12).unwrap(), 12);
/// assert!(validate_id("customer id", 0).is_err());
/// ```
pub fn validate_id(field: &str, raw: i64) -> ValidationResult<u32> {
    if raw <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    u32::try_from(raw).map_err(|_| ValidationError::OutOfRange {
        field: field.to_string(),
        min: 1,
        max: i64::from(u32::MAX),
    })
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a trimmed name against inclusive length bounds.
///
/// ## Rules Used Across the Model
/// - restaurant name: 2..=100
/// - department: 2..=100
/// - menu and dish names: 1..=100
pub fn validate_name(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::from(MAX_ITEM_QUANTITY),
        });
    }

    Ok(())
}

/// Validates a dish price in cents.
///
/// ## Rules
/// - Must be non-negative (complimentary dishes are allowed)
/// - Must not exceed MAX_PRICE_CENTS
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a payment amount (> 0).
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a restaurant's table capacity (>= 1).
pub fn validate_capacity(max_capacity: u32) -> ValidationResult<()> {
    if max_capacity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "max capacity".to_string(),
        });
    }

    Ok(())
}

/// Validates a reservation party size (>= 1).
pub fn validate_party_size(party_size: u16) -> ValidationResult<()> {
    if party_size == 0 {
        return Err(ValidationError::MustBePositive {
            field: "party size".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
