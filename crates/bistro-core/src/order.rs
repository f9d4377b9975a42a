//! # Orders and Line Items
//!
//! The order aggregator: line-item bookkeeping and totals.
//!
//! ## Line Item Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Line Item Operations                           │
//! │                                                                         │
//! │  Operation                       Effect                                 │
//! │  ─────────                       ──────                                 │
//! │                                                                         │
//! │  add_item(dish, q)          ───► new line, or existing line += q       │
//! │  set_item_quantity(id, q)   ───► existing line = q                     │
//! │  reduce_item(id, q)         ───► existing line -= q (0 drops the line) │
//! │  remove_item(id)            ───► line dropped, or Outcome::NotFound    │
//! │                                                                         │
//! │  calculate_total()          ───► Σ dish.price × quantity               │
//! │  total_items()              ───► Σ quantity                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line item per dish identity (repeated adds merge)
//! - Every line item has quantity in 1..=MAX_ITEM_QUANTITY
//! - The order total always fits in `i64` cents; add_item and
//!   set_item_quantity reject any change that would break this
//! - Customer and payment back-references are only written by the
//!   association manager

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::error::{CoreError, CoreResult};
use crate::menu::Dish;
use crate::money::Money;
use crate::types::{CustomerId, DishId, OrderId, Outcome, PaymentId};
use crate::validation::{validate_price, validate_quantity};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Line Item
// =============================================================================

/// A dish and how many of it were ordered.
///
/// The dish is a snapshot taken when the line was created, so later menu
/// price changes do not alter an open order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    dish: Dish,
    quantity: u32,
}

impl LineItem {
    pub fn dish(&self) -> &Dish {
        &self.dish
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `dish.price × quantity`.
    pub fn total_price(&self) -> Money {
        self.dish.price.multiply_quantity(self.quantity)
    }
}

/// What [`Order::add_item`] did with the requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ItemChange {
    /// A new line item was appended.
    Added { quantity: u32 },
    /// The quantity was merged into an existing line item.
    Merged { previous: u32, quantity: u32 },
}

impl ItemChange {
    /// Line quantity after the change.
    pub fn quantity(&self) -> u32 {
        match self {
            ItemChange::Added { quantity } | ItemChange::Merged { quantity, .. } => *quantity,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order.
///
/// Equality follows the business key (id, timestamp, line items). Hashing
/// uses the id and timestamp only, which keeps equal orders hashing equal.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    id: OrderId,
    placed_at: DateTime<Utc>,
    items: Vec<LineItem>,
    customer: Option<CustomerId>,
    payment: Option<PaymentId>,
}

impl Order {
    /// Creates an empty order stamped with the current time.
    pub fn new(id: OrderId) -> Self {
        Self::with_timestamp(id, Utc::now())
    }

    pub fn with_timestamp(id: OrderId, placed_at: DateTime<Utc>) -> Self {
        Order {
            id,
            placed_at,
            items: Vec::new(),
            customer: None,
            payment: None,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    /// Read-only view of the line items, in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, dish_id: DishId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.dish.id == dish_id)
    }

    pub fn customer(&self) -> Option<CustomerId> {
        self.customer
    }

    pub fn payment(&self) -> Option<PaymentId> {
        self.payment
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `quantity` units of `dish`, merging into an existing line item for
    /// the same dish.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::{Dish, DishId, Money, Order, OrderId};
    ///
    /// let mut order = Order::new(OrderId::new(1));
    /// let soda = Dish::new(DishId::new(2), "Soda", Money::from_cents(200));
    ///
    /// order.add_item(&soda, 1).unwrap();
    /// order.add_item(&soda, 2).unwrap();
    ///
    /// assert_eq!(order.items().len(), 1);
    /// assert_eq!(order.total_items(), 3);
    /// assert_eq!(order.calculate_total(), Money::from_cents(600));
    /// ```
    pub fn add_item(&mut self, dish: &Dish, quantity: u32) -> CoreResult<ItemChange> {
        validate_quantity(quantity)?;
        validate_price(dish.price)?;

        if let Some(idx) = self.items.iter().position(|i| i.dish == *dish) {
            let previous = self.items[idx].quantity;
            let merged = previous
                .checked_add(quantity)
                .filter(|q| *q <= MAX_ITEM_QUANTITY)
                .ok_or(CoreError::QuantityOverflow {
                    dish_id: dish.id,
                    current: previous,
                    added: quantity,
                })?;
            self.projected_total(dish.id, dish.price, merged)?;
            self.items[idx].quantity = merged;
            return Ok(ItemChange::Merged {
                previous,
                quantity: merged,
            });
        }

        self.projected_total(dish.id, dish.price, quantity)?;
        self.items.push(LineItem {
            dish: dish.clone(),
            quantity,
        });
        Ok(ItemChange::Added { quantity })
    }

    /// Drops the line item for `dish_id`.
    pub fn remove_item(&mut self, dish_id: DishId) -> Outcome {
        let initial_len = self.items.len();
        self.items.retain(|i| i.dish.id != dish_id);

        if self.items.len() == initial_len {
            Outcome::NotFound
        } else {
            Outcome::Applied
        }
    }

    /// Replaces the quantity of an existing line item. Returns the previous
    /// quantity.
    pub fn set_item_quantity(&mut self, dish_id: DishId, quantity: u32) -> CoreResult<u32> {
        validate_quantity(quantity)?;

        let order_id = self.id;
        let idx = self
            .items
            .iter()
            .position(|i| i.dish.id == dish_id)
            .ok_or(CoreError::ItemNotInOrder { order_id, dish_id })?;

        self.projected_total(dish_id, self.items[idx].dish.price, quantity)?;
        let previous = self.items[idx].quantity;
        self.items[idx].quantity = quantity;
        Ok(previous)
    }

    /// Takes `quantity` units off a line item; the line disappears when it
    /// reaches zero. Returns the remaining quantity.
    pub fn reduce_item(&mut self, dish_id: DishId, quantity: u32) -> CoreResult<u32> {
        validate_quantity(quantity)?;

        let order_id = self.id;
        let idx = self
            .items
            .iter()
            .position(|i| i.dish.id == dish_id)
            .ok_or(CoreError::ItemNotInOrder { order_id, dish_id })?;

        let available = self.items[idx].quantity;
        if quantity > available {
            return Err(CoreError::InsufficientQuantity {
                dish_id,
                available,
                requested: quantity,
            });
        }

        let remaining = available - quantity;
        if remaining == 0 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity = remaining;
        }
        Ok(remaining)
    }

    /// Sum of `price × quantity` over all line items.
    ///
    /// Cannot overflow: every path that grows a line checks the resulting
    /// total first.
    pub fn calculate_total(&self) -> Money {
        self.items.iter().map(LineItem::total_price).sum()
    }

    /// Total the order would have with the line for `dish_id` at `quantity`
    /// (appended at `price` when absent).
    fn projected_total(&self, dish_id: DishId, price: Money, quantity: u32) -> CoreResult<Money> {
        let order_id = self.id;
        let overflow = || CoreError::TotalOverflow { order_id };
        let mut replaced = false;
        let mut total = Money::zero();

        for item in &self.items {
            let line = if item.dish.id == dish_id {
                replaced = true;
                item.dish.price.checked_multiply_quantity(quantity)
            } else {
                item.dish.price.checked_multiply_quantity(item.quantity)
            };
            total = line
                .and_then(|line| total.checked_add(line))
                .ok_or_else(overflow)?;
        }

        if !replaced {
            total = price
                .checked_multiply_quantity(quantity)
                .and_then(|line| total.checked_add(line))
                .ok_or_else(overflow)?;
        }
        Ok(total)
    }

    /// Sum of quantities over all line items.
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub(crate) fn set_customer(&mut self, customer: Option<CustomerId>) {
        self.customer = customer;
    }

    pub(crate) fn set_payment(&mut self, payment: Option<PaymentId>) {
        self.payment = payment;
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.placed_at == other.placed_at && self.items == other.items
    }
}

impl Eq for Order {}

impl Hash for Order {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.placed_at.hash(state);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn dish(id: u32, price_cents: i64) -> Dish {
        Dish::new(DishId::new(id), format!("Dish {}", id), Money::from_cents(price_cents))
    }

    fn order() -> Order {
        Order::new(OrderId::new(1))
    }

    #[test]
    fn test_add_same_dish_merges_quantity() {
        let mut order = order();
        let pasta = dish(1, 1200);

        assert_eq!(order.add_item(&pasta, 2).unwrap(), ItemChange::Added { quantity: 2 });
        assert_eq!(
            order.add_item(&pasta, 3).unwrap(),
            ItemChange::Merged {
                previous: 2,
                quantity: 5
            }
        );

        assert_eq!(order.items().len(), 1);
        assert_eq!(order.item(DishId::new(1)).unwrap().quantity(), 5);
    }

    #[test]
    fn test_merge_uses_dish_identity_not_snapshot() {
        let mut order = order();
        order.add_item(&dish(1, 1200), 1).unwrap();
        // same id, different price: still the same dish
        order.add_item(&dish(1, 1500), 1).unwrap();

        assert_eq!(order.items().len(), 1);
        assert_eq!(order.calculate_total(), Money::from_cents(2400));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut order = order();
        let err = order.add_item(&dish(1, 100), 0).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert!(order.is_empty());
    }

    #[test]
    fn test_quantity_overflow_rejected_without_mutation() {
        let mut order = order();
        let d = dish(1, 100);
        order.add_item(&d, MAX_ITEM_QUANTITY).unwrap();

        let err = order.add_item(&d, 1).unwrap_err();
        assert!(matches!(err, CoreError::QuantityOverflow { .. }));
        assert_eq!(order.item(d.id).unwrap().quantity(), MAX_ITEM_QUANTITY);

        assert!(order.add_item(&dish(2, 100), u32::MAX).is_err());
        assert_eq!(order.items().len(), 1);
    }

    #[test]
    fn test_oversized_price_rejected_before_totals() {
        let mut order = order();
        let caviar = dish(1, i64::MAX / 2);

        let err = order.add_item(&caviar, 3).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert!(order.is_empty());
        assert_eq!(order.calculate_total(), Money::zero());

        let priciest = dish(2, crate::MAX_PRICE_CENTS);
        order.add_item(&priciest, MAX_ITEM_QUANTITY).unwrap();
        assert_eq!(
            order.calculate_total(),
            Money::from_cents(crate::MAX_PRICE_CENTS * i64::from(MAX_ITEM_QUANTITY))
        );
    }

    #[test]
    fn test_projected_total_reports_overflow() {
        let mut order = order();
        order.items.push(LineItem {
            dish: dish(1, i64::MAX / 2),
            quantity: 1,
        });

        assert!(order.projected_total(DishId::new(1), Money::zero(), 2).is_ok());
        assert!(matches!(
            order.projected_total(DishId::new(1), Money::zero(), 3),
            Err(CoreError::TotalOverflow { .. })
        ));
        assert!(matches!(
            order.projected_total(DishId::new(2), Money::from_cents(i64::MAX / 2), 2),
            Err(CoreError::TotalOverflow { .. })
        ));
    }

    #[test]
    fn test_remove_item() {
        let mut order = order();
        order.add_item(&dish(1, 100), 1).unwrap();

        assert_eq!(order.remove_item(DishId::new(1)), Outcome::Applied);
        assert_eq!(order.remove_item(DishId::new(1)), Outcome::NotFound);
        assert!(order.is_empty());
    }

    #[test]
    fn test_total_is_order_independent() {
        let a = dish(1, 1200);
        let b = dish(2, 200);
        let c = dish(3, 875);

        let mut first = order();
        first.add_item(&a, 1).unwrap();
        first.add_item(&b, 2).unwrap();
        first.add_item(&c, 1).unwrap();
        first.add_item(&a, 2).unwrap();
        first.remove_item(c.id);

        let mut second = order();
        second.add_item(&b, 1).unwrap();
        second.add_item(&c, 4).unwrap();
        second.add_item(&a, 3).unwrap();
        second.add_item(&b, 1).unwrap();
        second.remove_item(c.id);

        let expected = Money::from_cents(1200 * 3 + 200 * 2);
        assert_eq!(first.calculate_total(), expected);
        assert_eq!(second.calculate_total(), expected);
        assert_eq!(first.total_items(), 5);
        assert_eq!(second.total_items(), 5);
    }

    #[test]
    fn test_set_item_quantity() {
        let mut order = order();
        order.add_item(&dish(1, 500), 2).unwrap();

        assert_eq!(order.set_item_quantity(DishId::new(1), 7).unwrap(), 2);
        assert_eq!(order.total_items(), 7);

        let err = order.set_item_quantity(DishId::new(9), 1).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(order.set_item_quantity(DishId::new(1), 0).is_err());
    }

    #[test]
    fn test_reduce_item() {
        let mut order = order();
        order.add_item(&dish(1, 500), 3).unwrap();

        assert_eq!(order.reduce_item(DishId::new(1), 1).unwrap(), 2);
        assert!(matches!(
            order.reduce_item(DishId::new(1), 5),
            Err(CoreError::InsufficientQuantity {
                available: 2,
                requested: 5,
                ..
            })
        ));
        assert_eq!(order.reduce_item(DishId::new(1), 2).unwrap(), 0);
        assert!(order.is_empty());
    }

    #[test]
    fn test_order_equality_by_business_key() {
        let at = Utc::now();
        let mut a = Order::with_timestamp(OrderId::new(5), at);
        let mut b = Order::with_timestamp(OrderId::new(5), at);
        assert_eq!(a, b);

        a.add_item(&dish(1, 100), 1).unwrap();
        assert_ne!(a, b);
        b.add_item(&dish(1, 100), 1).unwrap();
        assert_eq!(a, b);

        // back-references are not part of identity
        a.set_customer(Some(CustomerId::new(1)));
        assert_eq!(a, b);
    }
}
