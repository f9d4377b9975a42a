//! # Order and Payment Flow
//!
//! The two customer-facing commands, branching on [`Role`].
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order / Payment Flow                              │
//! │                                                                         │
//! │  place_order(customer, dishes)                                          │
//! │  ├── dishes empty?                    ── EmptyOrder                     │
//! │  ├── allocate id                      ── KeysExhausted                  │
//! │  ├── build Order (now, 1 unit per dish, merged)                         │
//! │  ├── register Order, link Customer ↔ Order                              │
//! │  └── Member:    accrue points_per_dish × dishes                         │
//! │      NonMember: no rewards                                              │
//! │                                                                         │
//! │  make_payment(customer, order, method)                                  │
//! │  ├── order already has a non-pending payment?  ── OrderAlreadyPaid      │
//! │  ├── allocate id; amount = order total; build Payment, process() it     │
//! │  ├── register Payment, link Order ↔ Payment                             │
//! │  └── Member with credits: redeem floor(whole units / divisor)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything that can fail runs before the first mutation, so a rejected
//! command leaves balances and the journal as they were. Credits are
//! bookkeeping only: the charged amount is always the full order total.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::customer::Role;
use crate::error::{CoreError, CoreResult};
use crate::events::DomainEvent;
use crate::menu::Dish;
use crate::money::Money;
use crate::order::Order;
use crate::payment::Payment;
use crate::registry::Registry;
use crate::types::{CustomerId, OrderId, Outcome, PaymentId, PaymentMethod, PaymentStatus};

// =============================================================================
// Reward Policy
// =============================================================================

/// Member reward parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    /// Points a member earns per ordered dish.
    pub points_per_dish: u32,
    /// Whole currency units per redeemed credit. Zero disables redemption.
    pub credit_divisor: u32,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        RewardPolicy {
            points_per_dish: 1,
            credit_divisor: 10,
        }
    }
}

impl RewardPolicy {
    /// Points earned for an order of `dishes` dishes (saturating).
    pub fn points_for(&self, dishes: usize) -> u32 {
        let dishes = u32::try_from(dishes).unwrap_or(u32::MAX);
        self.points_per_dish.saturating_mul(dishes)
    }

    /// Credits a payment of `total` asks to redeem: whole units divided by
    /// the divisor, truncating.
    ///
    /// ```rust
    /// use bistro_core::{Money, RewardPolicy};
    ///
    /// let policy = RewardPolicy::default();
    /// assert_eq!(policy.credits_for(Money::from_cents(1400)), 1);
    /// assert_eq!(policy.credits_for(Money::from_cents(999)), 0);
    /// ```
    pub fn credits_for(&self, total: Money) -> u32 {
        let units = total.whole_units().max(0);
        units
            .checked_div(i64::from(self.credit_divisor))
            .map_or(0, |credits| u32::try_from(credits).unwrap_or(u32::MAX))
    }
}

// =============================================================================
// Registry Flow Commands
// =============================================================================

impl Registry {
    /// Places a new order of one unit per listed dish for `customer`.
    ///
    /// Repeated dishes merge into one line item.
    pub fn place_order(&mut self, customer: CustomerId, dishes: &[Dish]) -> CoreResult<OrderId> {
        if dishes.is_empty() {
            return Err(CoreError::EmptyOrder);
        }
        let is_member = self.require_customer(customer)?.role().is_member();

        let id = self.next_order_id()?;
        let mut order = Order::new(id);
        for dish in dishes {
            order.add_item(dish, 1)?;
        }
        let total = order.calculate_total();

        self.register_order(order)?;
        self.set_order_customer(id, Some(customer))?;

        if is_member {
            let points = self.policy.points_for(dishes.len());
            let balance = self
                .require_customer_mut(customer)?
                .role_mut()
                .accrue(points)
                .unwrap_or_default();
            debug!(%customer, points, balance, "Rewards accrued");
            self.journal.record(DomainEvent::RewardsAccrued {
                customer,
                points,
                balance,
            });
        }

        info!(order = %id, %customer, dishes = dishes.len(), %total, "Order placed");
        self.journal.record(DomainEvent::OrderPlaced {
            order: id,
            customer,
            dishes: dishes.len(),
            total,
        });
        Ok(id)
    }

    /// Pays `order` in full and binds the completed payment to it.
    ///
    /// ## Errors
    /// - `OrderAlreadyPaid`: the order carries a Completed or Refunded payment
    /// - `Validation`: the order total is not positive (empty order)
    /// - `KeysExhausted`: no payment key is left
    ///
    /// A Pending payment left on the order is replaced. On error nothing is
    /// changed.
    pub fn make_payment(
        &mut self,
        customer: CustomerId,
        order: OrderId,
        method: PaymentMethod,
    ) -> CoreResult<PaymentId> {
        let credits = self.require_customer(customer)?.role().credit_points();
        let target = self.require_order(order)?;
        let total = target.calculate_total();

        if let Some(existing) = target.payment() {
            let status = self.require_payment(existing)?.status();
            if status != PaymentStatus::Pending {
                return Err(CoreError::OrderAlreadyPaid {
                    order_id: order,
                    payment_id: existing,
                    status,
                });
            }
        }

        let id = self.next_payment_id()?;
        let mut payment = Payment::new(id, total, method)?;
        payment.process()?;

        self.register_payment(payment)?;
        self.set_payment_order(id, Some(order))?;

        if credits.is_some_and(|balance| balance > 0) {
            let requested = self.policy.credits_for(total);
            let role = self.require_customer_mut(customer)?.role_mut();
            let used = role.use_credits(requested);
            let balance = role.credit_points().unwrap_or_default();
            debug!(%customer, requested, used, balance, "Credits redeemed");
            self.journal.record(DomainEvent::CreditsRedeemed {
                customer,
                requested,
                used,
                balance,
            });
        }

        info!(payment = %id, %order, amount = %total, %method, "Payment processed");
        self.journal.record(DomainEvent::PaymentProcessed {
            payment: id,
            order,
            amount: total,
            method,
        });
        Ok(id)
    }

    /// Refunds a completed payment.
    pub fn refund_payment(&mut self, payment: PaymentId) -> CoreResult<()> {
        let target = self.require_payment_mut(payment)?;
        target.refund()?;
        let amount = target.amount();

        info!(%payment, %amount, "Payment refunded");
        self.journal
            .record(DomainEvent::PaymentRefunded { payment, amount });
        Ok(())
    }

    /// Replaces the customer's role. Switching to the role already held is
    /// `Unchanged`.
    pub fn switch_role(&mut self, customer: CustomerId, role: Role) -> CoreResult<Outcome> {
        let current = self.require_customer_mut(customer)?.role_mut();
        if *current == role {
            return Ok(Outcome::Unchanged);
        }
        *current = role;

        debug!(%customer, role = role.label(), "Role switched");
        self.journal.record(DomainEvent::RoleSwitched {
            customer,
            role: role.label(),
        });
        Ok(Outcome::Applied)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::Customer;
    use crate::error::ErrorCategory;
    use crate::types::DishId;

    fn pasta() -> Dish {
        Dish::new(DishId::new(1), "Pasta", Money::from_cents(1200))
    }

    fn soda() -> Dish {
        Dish::new(DishId::new(2), "Soda", Money::from_cents(200))
    }

    fn registry_with(role: Role) -> Registry {
        let mut registry = Registry::new();
        registry
            .register_customer(Customer::new(CustomerId::new(1), role))
            .unwrap();
        registry
    }

    #[test]
    fn test_credits_for_truncates() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.credits_for(Money::from_cents(1999)), 1);
        assert_eq!(policy.credits_for(Money::from_cents(2000)), 2);
        assert_eq!(policy.credits_for(Money::from_cents(-500)), 0);

        let disabled = RewardPolicy {
            credit_divisor: 0,
            ..RewardPolicy::default()
        };
        assert_eq!(disabled.credits_for(Money::from_cents(10_000)), 0);
    }

    #[test]
    fn test_place_order_rejects_empty() {
        let mut registry = registry_with(Role::member());
        let err = registry.place_order(CustomerId::new(1), &[]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert!(registry.events().is_empty());
        assert_eq!(registry.customer(CustomerId::new(1)).unwrap().role().credit_points(), Some(0));
    }

    #[test]
    fn test_place_order_merges_repeated_dishes() {
        let mut registry = registry_with(Role::NonMember);
        let order = registry
            .place_order(CustomerId::new(1), &[soda(), pasta(), soda()])
            .unwrap();

        let order = registry.order(order).unwrap();
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.item(DishId::new(2)).unwrap().quantity(), 2);
        assert_eq!(order.calculate_total(), Money::from_cents(1600));
        assert_eq!(order.customer(), Some(CustomerId::new(1)));
    }

    #[test]
    fn test_member_accrues_per_dish() {
        let mut registry = registry_with(Role::Member { credit_points: 5 });
        registry
            .place_order(CustomerId::new(1), &[pasta(), soda()])
            .unwrap();

        let role = registry.customer(CustomerId::new(1)).unwrap().role();
        assert_eq!(role.credit_points(), Some(7));
    }

    #[test]
    fn test_second_payment_rejected() {
        let mut registry = registry_with(Role::NonMember);
        let customer = CustomerId::new(1);
        let order = registry.place_order(customer, &[pasta()]).unwrap();
        let first = registry
            .make_payment(customer, order, PaymentMethod::Card)
            .unwrap();

        let err = registry
            .make_payment(customer, order, PaymentMethod::Cash)
            .unwrap_err();
        assert!(matches!(err, CoreError::OrderAlreadyPaid { .. }));
        assert_eq!(registry.order(order).unwrap().payment(), Some(first));
        assert_eq!(registry.payments().count(), 1);
    }

    #[test]
    fn test_refund_then_pay_again_still_rejected() {
        let mut registry = registry_with(Role::NonMember);
        let customer = CustomerId::new(1);
        let order = registry.place_order(customer, &[pasta()]).unwrap();
        let payment = registry
            .make_payment(customer, order, PaymentMethod::Mobile)
            .unwrap();

        registry.refund_payment(payment).unwrap();
        assert_eq!(
            registry.payment(payment).unwrap().status(),
            PaymentStatus::Refunded
        );
        assert!(registry.refund_payment(payment).is_err());
        assert!(registry
            .make_payment(customer, order, PaymentMethod::Cash)
            .is_err());
    }

    #[test]
    fn test_pending_payment_is_replaced() {
        let mut registry = registry_with(Role::NonMember);
        let customer = CustomerId::new(1);
        let order = registry.place_order(customer, &[soda()]).unwrap();

        let stale = Payment::new(PaymentId::new(1), Money::from_cents(200), PaymentMethod::Cash)
            .unwrap();
        registry.register_payment(stale).unwrap();
        registry.set_order_payment(order, PaymentId::new(1)).unwrap();

        let paid = registry
            .make_payment(customer, order, PaymentMethod::Card)
            .unwrap();
        assert_eq!(paid, PaymentId::new(2));
        assert_eq!(registry.order(order).unwrap().payment(), Some(paid));
        assert_eq!(registry.payment(PaymentId::new(1)).unwrap().order(), None);
    }

    #[test]
    fn test_keys_past_u32_max_reuse_lowest_gap() {
        let mut registry = registry_with(Role::Member { credit_points: 50 });
        let member = CustomerId::new(1);
        registry
            .register_order(Order::new(OrderId::new(u32::MAX)))
            .unwrap();
        let stray = Payment::new(
            PaymentId::new(u32::MAX),
            Money::from_cents(100),
            PaymentMethod::Cash,
        )
        .unwrap();
        registry.register_payment(stray).unwrap();

        let order = registry.place_order(member, &[pasta()]).unwrap();
        assert_eq!(order, OrderId::new(1));
        let payment = registry
            .make_payment(member, order, PaymentMethod::Card)
            .unwrap();
        assert_eq!(payment, PaymentId::new(1));

        // +1 accrued, -1 redeemed for a $12.00 order
        let role = registry.customer(member).unwrap().role();
        assert_eq!(role.credit_points(), Some(50));
    }

    #[test]
    fn test_rejected_order_keeps_credits_and_journal() {
        let mut registry = registry_with(Role::Member { credit_points: 50 });
        let member = CustomerId::new(1);
        let caviar = Dish::new(DishId::new(9), "Caviar", Money::from_cents(i64::MAX / 2));

        let err = registry.place_order(member, &[pasta(), caviar]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert_eq!(registry.customer(member).unwrap().role().credit_points(), Some(50));
        assert!(registry.events().is_empty());
        assert_eq!(registry.orders().count(), 0);
        assert!(registry.customer(member).unwrap().orders().is_empty());
    }

    #[test]
    fn test_rejected_payment_keeps_credits_and_journal() {
        let mut registry = registry_with(Role::Member { credit_points: 50 });
        let member = CustomerId::new(1);
        let order = registry.place_order(member, &[pasta()]).unwrap();
        registry
            .make_payment(member, order, PaymentMethod::Card)
            .unwrap();
        let recorded = registry.events().len();

        assert!(registry
            .make_payment(member, order, PaymentMethod::Cash)
            .is_err());
        assert_eq!(registry.customer(member).unwrap().role().credit_points(), Some(50));
        assert_eq!(registry.events().len(), recorded);

        // a free order cannot be paid, and costs no credits either
        let water = Dish::new(DishId::new(3), "Water", Money::zero());
        let free = registry.place_order(member, &[water]).unwrap();
        let before = registry.customer(member).unwrap().role().credit_points();
        let recorded = registry.events().len();

        assert!(registry
            .make_payment(member, free, PaymentMethod::Cash)
            .is_err());
        assert_eq!(registry.customer(member).unwrap().role().credit_points(), before);
        assert_eq!(registry.events().len(), recorded);
        assert_eq!(registry.payments().count(), 1);
    }

    #[test]
    fn test_switch_role() {
        let mut registry = registry_with(Role::NonMember);
        let customer = CustomerId::new(1);

        assert_eq!(
            registry.switch_role(customer, Role::NonMember).unwrap(),
            Outcome::Unchanged
        );
        assert_eq!(
            registry.switch_role(customer, Role::member()).unwrap(),
            Outcome::Applied
        );
        assert!(registry.customer(customer).unwrap().role().is_member());
        assert_eq!(registry.events().len(), 1);
    }
}
