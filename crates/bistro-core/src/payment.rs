//! # Payments
//!
//! A payment and its state machine.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Payment Lifecycle                                 │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── Payment::new() → Payment { status: Pending }                   │
//! │                                                                         │
//! │  2. PROCESS                                                             │
//! │     └── process() → Completed                                          │
//! │         (any other starting state: InvalidPaymentTransition)           │
//! │                                                                         │
//! │  3. (OPTIONAL) REFUND                                                   │
//! │     └── refund() → Refunded                                            │
//! │         (only from Completed)                                          │
//! │                                                                         │
//! │  A failed transition never changes the status.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::hash::{Hash, Hasher};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{OrderId, PaymentId, PaymentMethod, PaymentStatus};
use crate::validation::validate_payment_amount;

/// A payment towards an order.
///
/// Identity is (id, amount, method); status and the order back-reference
/// are state, not identity.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    id: PaymentId,
    amount: Money,
    method: PaymentMethod,
    status: PaymentStatus,
    order: Option<OrderId>,
}

impl Payment {
    /// Creates a pending payment. The amount must be positive.
    pub fn new(id: PaymentId, amount: Money, method: PaymentMethod) -> CoreResult<Self> {
        validate_payment_amount(amount)?;

        Ok(Payment {
            id,
            amount,
            method,
            status: PaymentStatus::Pending,
            order: None,
        })
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// The order this payment settles, if attached.
    pub fn order(&self) -> Option<OrderId> {
        self.order
    }

    /// Pending → Completed.
    pub fn process(&mut self) -> CoreResult<()> {
        self.transition(PaymentStatus::Pending, PaymentStatus::Completed, "process")
    }

    /// Completed → Refunded.
    pub fn refund(&mut self) -> CoreResult<()> {
        self.transition(PaymentStatus::Completed, PaymentStatus::Refunded, "refund")
    }

    fn transition(
        &mut self,
        from: PaymentStatus,
        to: PaymentStatus,
        operation: &'static str,
    ) -> CoreResult<()> {
        if self.status != from {
            return Err(CoreError::InvalidPaymentTransition {
                payment_id: self.id,
                status: self.status,
                operation,
            });
        }
        self.status = to;
        Ok(())
    }

    pub(crate) fn set_order(&mut self, order: Option<OrderId>) {
        self.order = order;
    }
}

impl PartialEq for Payment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.amount == other.amount && self.method == other.method
    }
}

impl Eq for Payment {}

impl Hash for Payment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.amount.hash(state);
        self.method.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn payment() -> Payment {
        Payment::new(PaymentId::new(1), Money::from_cents(1400), PaymentMethod::Cash).unwrap()
    }

    #[test]
    fn test_new_payment_is_pending() {
        let p = payment();
        assert_eq!(p.status(), PaymentStatus::Pending);
        assert_eq!(p.order(), None);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let err = Payment::new(PaymentId::new(1), Money::zero(), PaymentMethod::Card).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    }

    #[test]
    fn test_process_then_refund() {
        let mut p = payment();
        p.process().unwrap();
        assert_eq!(p.status(), PaymentStatus::Completed);
        p.refund().unwrap();
        assert_eq!(p.status(), PaymentStatus::Refunded);
    }

    #[test]
    fn test_process_twice_fails_without_change() {
        let mut p = payment();
        p.process().unwrap();

        let err = p.process().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidState);
        assert_eq!(p.status(), PaymentStatus::Completed);
    }

    #[test]
    fn test_refund_requires_completed() {
        let mut p = payment();
        assert!(p.refund().is_err());
        assert_eq!(p.status(), PaymentStatus::Pending);

        p.process().unwrap();
        p.refund().unwrap();
        assert!(p.refund().is_err());
        assert!(p.process().is_err());
        assert_eq!(p.status(), PaymentStatus::Refunded);
    }

    #[test]
    fn test_equality_ignores_status() {
        let mut a = payment();
        let b = payment();
        a.process().unwrap();
        assert_eq!(a, b);

        let c = Payment::new(PaymentId::new(1), Money::from_cents(1400), PaymentMethod::Card).unwrap();
        assert_ne!(a, c);
    }
}
