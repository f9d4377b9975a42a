//! # bistro-core: Restaurant Domain Model
//!
//! Customers, orders, payments, staff, reservations and menus, with the
//! bookkeeping that keeps every two-sided relationship between them
//! consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  bistro console (apps/console)                  │   │
//! │  │   config ──► scenario ──► narrate (text / JSON lines)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Registry commands                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bistro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌─────────────┐  ┌───────────┐  ┌──────────┐  │   │
//! │  │   │   flow    │  │ association │  │   order   │  │  events  │  │   │
//! │  │   │ place_    │  │  LinkSet    │  │ LineItem  │  │ journal  │  │   │
//! │  │   │ order/pay │  │  Relink     │  │ totals    │  │          │  │   │
//! │  │   └─────┬─────┘  └──────┬──────┘  └─────┬─────┘  └──────────┘  │   │
//! │  │         └───────────────┴───────────────┘                       │   │
//! │  │                      Registry (owns all entities)               │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO PRINTING • SINGLE-THREADED                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`registry`] - Entity storage, lookups, line-item and table commands
//! - [`association`] - Two-sided links (customer↔order, order↔payment, ...)
//! - [`flow`] - Role-dependent order placement and payment
//! - [`order`] - Line items and order totals
//! - [`events`] - Journal of everything that changed
//! - [`valet`] - Valet parking for customers who arrive by car
//! - [`money`] - Integer-cent money
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use bistro_core::{Customer, CustomerId, Dish, DishId, Money, PaymentMethod, Registry, Role};
//!
//! let mut registry = Registry::new();
//! let guest = registry
//!     .register_customer(Customer::new(CustomerId::new(1), Role::NonMember))
//!     .unwrap();
//!
//! let pasta = Dish::new(DishId::new(1), "Pasta", Money::from_cents(1200));
//! let soda = Dish::new(DishId::new(2), "Soda", Money::from_cents(200));
//!
//! let order = registry.place_order(guest, &[pasta, soda]).unwrap();
//! let payment = registry.make_payment(guest, order, PaymentMethod::Cash).unwrap();
//!
//! assert_eq!(registry.payment(payment).unwrap().amount().to_string(), "$14.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod association;
pub mod customer;
pub mod employee;
pub mod error;
pub mod events;
pub mod flow;
pub mod menu;
pub mod money;
pub mod order;
pub mod payment;
pub mod registry;
pub mod restaurant;
pub mod types;
pub mod valet;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use association::LinkSet;
pub use customer::{Customer, Reservation, Role};
pub use employee::Employee;
pub use error::{CoreError, CoreResult, ErrorCategory, ValidationError};
pub use events::{DomainEvent, EventJournal, RecordedEvent};
pub use flow::RewardPolicy;
pub use menu::{Dish, Menu};
pub use money::Money;
pub use order::{ItemChange, LineItem, Order};
pub use payment::Payment;
pub use registry::Registry;
pub use restaurant::{Restaurant, Table};
pub use types::*;
pub use valet::Valet;

// =============================================================================
// Business Constants
// =============================================================================

/// Maximum quantity of a single line item.
///
/// Together with [`MAX_PRICE_CENTS`] this keeps every line total far inside
/// the `i64` cent range.
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Maximum dish price in cents ($1,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Events the journal holds before the oldest ones are dropped.
///
/// Callers are expected to drain the journal regularly; the cap only bounds
/// memory when they do not.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 10_000;
