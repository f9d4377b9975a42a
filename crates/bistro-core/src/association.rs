//! # Association Manager
//!
//! Keeps both sides of every paired relationship consistent.
//!
//! ## Relink Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  set_association(dependent, new_owner)                  │
//! │                                                                         │
//! │  1. validate dependent and new_owner exist      ── Err, nothing touched │
//! │  2. new_owner == current owner?                 ── Outcome::Unchanged   │
//! │  3. remove dependent from old owner's LinkSet                           │
//! │  4. write dependent's owner field                                       │
//! │  5. add dependent to new owner's LinkSet (if any)                       │
//! │  6. record the event                                                    │
//! │                                                                         │
//! │  Pairs:                                                                 │
//! │    Customer ─1:N─► Order        Order ─1:1─► Payment                    │
//! │    Customer ─1:N─► Reservation  (keyed, DuplicateKey on re-add)         │
//! │    Employee ─1:N─► Employee     (tree, SupervisorCycle on loops)        │
//! │    Restaurant ─1:N─► Menu                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 3-5 run only after step 1 has passed, so a failed call never leaves
//! one side updated without the other.

use serde::Serialize;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::events::DomainEvent;
use crate::registry::Registry;
use crate::types::{CustomerId, EmployeeId, EntityKind, OrderId, Outcome, PaymentId, ReservationId};

// =============================================================================
// Link Set
// =============================================================================

/// Reverse side of a one-to-many association, in insertion order.
///
/// Read-only outside the crate: only the association manager adds or
/// removes members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LinkSet<K> {
    members: Vec<K>,
}

impl<K> Default for LinkSet<K> {
    fn default() -> Self {
        LinkSet {
            members: Vec::new(),
        }
    }
}

impl<K: PartialEq> LinkSet<K> {
    pub fn contains(&self, key: &K) -> bool {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.members.iter()
    }

    pub fn as_slice(&self) -> &[K] {
        &self.members
    }

    /// Adds `key` unless already present. Returns whether it was added.
    pub(crate) fn insert(&mut self, key: K) -> bool {
        if self.members.contains(&key) {
            return false;
        }
        self.members.push(key);
        true
    }

    /// Removes `key`. Returns whether it was present.
    pub(crate) fn remove(&mut self, key: &K) -> bool {
        let before = self.members.len();
        self.members.retain(|k| k != key);
        self.members.len() != before
    }
}

impl<'a, K> IntoIterator for &'a LinkSet<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

// =============================================================================
// Relink Plan
// =============================================================================

/// What a set-association call has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Relink<K> {
    Unchanged,
    Move { from: Option<K>, to: Option<K> },
}

impl<K: PartialEq> Relink<K> {
    pub(crate) fn plan(current: Option<K>, target: Option<K>) -> Self {
        if current == target {
            Relink::Unchanged
        } else {
            Relink::Move {
                from: current,
                to: target,
            }
        }
    }
}

// =============================================================================
// Registry Association Operations
// =============================================================================

impl Registry {
    // -------------------------------------------------------------------------
    // Customer ↔ Order
    // -------------------------------------------------------------------------

    /// Moves `order` to `customer` (or detaches it with `None`).
    pub fn set_order_customer(
        &mut self,
        order: OrderId,
        customer: Option<CustomerId>,
    ) -> CoreResult<Outcome> {
        let current = self.require_order(order)?.customer();
        if let Some(target) = customer {
            self.require_customer(target)?;
        }

        let (from, to) = match Relink::plan(current, customer) {
            Relink::Unchanged => return Ok(Outcome::Unchanged),
            Relink::Move { from, to } => (from, to),
        };

        if let Some(old) = from.and_then(|id| self.customers.get_mut(&id)) {
            old.orders_mut().remove(&order);
        }
        if let Some(o) = self.orders.get_mut(&order) {
            o.set_customer(to);
        }
        if let Some(new) = to.and_then(|id| self.customers.get_mut(&id)) {
            new.orders_mut().insert(order);
        }

        debug!(%order, ?from, ?to, "Order customer changed");
        self.journal
            .record(DomainEvent::OrderCustomerChanged { order, from, to });
        Ok(Outcome::Applied)
    }

    pub fn clear_order_customer(&mut self, order: OrderId) -> CoreResult<Outcome> {
        self.set_order_customer(order, None)
    }

    /// Customer-side view of [`Registry::set_order_customer`].
    pub fn add_order(&mut self, customer: CustomerId, order: OrderId) -> CoreResult<Outcome> {
        self.set_order_customer(order, Some(customer))
    }

    /// Detaches `order` from `customer`. `NotFound` when the order belongs to
    /// someone else or nobody.
    pub fn remove_order(&mut self, customer: CustomerId, order: OrderId) -> CoreResult<Outcome> {
        if !self.require_customer(customer)?.orders().contains(&order) {
            debug!(%customer, %order, "Order not held by customer");
            return Ok(Outcome::NotFound);
        }
        self.set_order_customer(order, None)
    }

    // -------------------------------------------------------------------------
    // Order ↔ Payment
    // -------------------------------------------------------------------------

    /// Binds `payment` to `order` one-to-one (or detaches it with `None`).
    ///
    /// A payment already on the target order is detached first.
    pub fn set_payment_order(
        &mut self,
        payment: PaymentId,
        order: Option<OrderId>,
    ) -> CoreResult<Outcome> {
        let current = self.require_payment(payment)?.order();
        let displaced = match order {
            Some(target) => self.require_order(target)?.payment(),
            None => None,
        };

        let (from, to) = match Relink::plan(current, order) {
            Relink::Unchanged => return Ok(Outcome::Unchanged),
            Relink::Move { from, to } => (from, to),
        };

        if let Some(old) = from.and_then(|id| self.orders.get_mut(&id)) {
            old.set_payment(None);
        }
        if let (Some(target), Some(previous)) = (to, displaced) {
            if let Some(p) = self.payments.get_mut(&previous) {
                p.set_order(None);
            }
            debug!(order = %target, payment = %previous, "Displaced payment detached");
            self.journal.record(DomainEvent::PaymentOrderChanged {
                payment: previous,
                from: Some(target),
                to: None,
            });
        }
        if let Some(p) = self.payments.get_mut(&payment) {
            p.set_order(to);
        }
        if let Some(new) = to.and_then(|id| self.orders.get_mut(&id)) {
            new.set_payment(Some(payment));
        }

        debug!(%payment, ?from, ?to, "Payment order changed");
        self.journal
            .record(DomainEvent::PaymentOrderChanged { payment, from, to });
        Ok(Outcome::Applied)
    }

    /// Order-side view of [`Registry::set_payment_order`].
    pub fn set_order_payment(&mut self, order: OrderId, payment: PaymentId) -> CoreResult<Outcome> {
        self.set_payment_order(payment, Some(order))
    }

    /// Detaches whatever payment `order` carries. `NotFound` when it has none.
    pub fn clear_order_payment(&mut self, order: OrderId) -> CoreResult<Outcome> {
        match self.require_order(order)?.payment() {
            Some(payment) => self.set_payment_order(payment, None),
            None => Ok(Outcome::NotFound),
        }
    }

    // -------------------------------------------------------------------------
    // Customer ↔ Reservation
    // -------------------------------------------------------------------------

    /// Gives `reservation` to `customer`, taking it from its previous holder.
    ///
    /// `DuplicateKey` when the customer already holds that key.
    pub fn add_reservation(
        &mut self,
        customer: CustomerId,
        reservation: ReservationId,
    ) -> CoreResult<Outcome> {
        let held = self.require_customer(customer)?.has_reservation(reservation);
        let previous = self
            .reservations
            .get(&reservation)
            .ok_or_else(|| CoreError::unknown(EntityKind::Reservation, reservation))?
            .customer();

        let outcome = if held {
            Outcome::DuplicateKey
        } else {
            if let Some(old) = previous.and_then(|id| self.customers.get_mut(&id)) {
                old.reservations_mut().remove(&reservation);
            }
            if let Some(r) = self.reservations.get_mut(&reservation) {
                r.set_customer(Some(customer));
            }
            if let Some(c) = self.customers.get_mut(&customer) {
                c.reservations_mut().insert(reservation);
            }
            Outcome::Applied
        };

        debug!(%customer, %reservation, ?previous, ?outcome, "Reservation added");
        self.journal.record(DomainEvent::ReservationAdded {
            customer,
            reservation,
            outcome,
        });
        Ok(outcome)
    }

    pub fn remove_reservation(
        &mut self,
        customer: CustomerId,
        reservation: ReservationId,
    ) -> CoreResult<Outcome> {
        let removed = self
            .require_customer_mut(customer)?
            .reservations_mut()
            .remove(&reservation);

        let outcome = if removed {
            if let Some(r) = self.reservations.get_mut(&reservation) {
                r.set_customer(None);
            }
            Outcome::Applied
        } else {
            Outcome::NotFound
        };

        debug!(%customer, %reservation, ?outcome, "Reservation removal");
        self.journal.record(DomainEvent::ReservationRemoved {
            customer,
            reservation,
            outcome,
        });
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Employee ↔ Supervisor
    // -------------------------------------------------------------------------

    /// Puts `employee` under `supervisor` (or makes it a root with `None`).
    ///
    /// ## Cycle Check
    /// ```text
    /// set_supervisor(A, Some(C))      walk up from C:
    ///
    ///     A                           C → B → A   ← found A: SupervisorCycle
    ///     └── B
    ///         └── C
    /// ```
    pub fn set_supervisor(
        &mut self,
        employee: EmployeeId,
        supervisor: Option<EmployeeId>,
    ) -> CoreResult<Outcome> {
        let current = self.require_employee(employee)?.supervisor();
        if let Some(target) = supervisor {
            self.require_employee(target)?;
            self.check_no_cycle(employee, target)?;
        }

        let (from, to) = match Relink::plan(current, supervisor) {
            Relink::Unchanged => return Ok(Outcome::Unchanged),
            Relink::Move { from, to } => (from, to),
        };

        if let Some(old) = from.and_then(|id| self.employees.get_mut(&id)) {
            old.subordinates_mut().remove(&employee);
        }
        if let Some(e) = self.employees.get_mut(&employee) {
            e.set_supervisor(to);
        }
        if let Some(new) = to.and_then(|id| self.employees.get_mut(&id)) {
            new.subordinates_mut().insert(employee);
        }

        debug!(%employee, ?from, ?to, "Supervisor changed");
        self.journal
            .record(DomainEvent::SupervisorChanged { employee, from, to });
        Ok(Outcome::Applied)
    }

    pub fn remove_supervisor(&mut self, employee: EmployeeId) -> CoreResult<Outcome> {
        self.set_supervisor(employee, None)
    }

    /// Supervisor-side view of [`Registry::set_supervisor`].
    pub fn add_subordinate(
        &mut self,
        supervisor: EmployeeId,
        employee: EmployeeId,
    ) -> CoreResult<Outcome> {
        self.set_supervisor(employee, Some(supervisor))
    }

    /// Detaches `employee` from `supervisor`. `NotFound` when it reports to
    /// someone else.
    pub fn remove_subordinate(
        &mut self,
        supervisor: EmployeeId,
        employee: EmployeeId,
    ) -> CoreResult<Outcome> {
        let reports = self
            .require_employee(supervisor)?
            .subordinates()
            .contains(&employee);
        self.require_employee(employee)?;

        let outcome = if reports {
            self.set_supervisor(employee, None)?
        } else {
            debug!(%supervisor, %employee, "Not a subordinate");
            Outcome::NotFound
        };

        self.journal.record(DomainEvent::SubordinateRemoved {
            supervisor,
            employee,
            outcome,
        });
        Ok(outcome)
    }

    fn check_no_cycle(&self, employee: EmployeeId, supervisor: EmployeeId) -> CoreResult<()> {
        let mut cursor = Some(supervisor);
        while let Some(id) = cursor {
            if id == employee {
                return Err(CoreError::SupervisorCycle {
                    employee,
                    supervisor,
                });
            }
            cursor = self.employees.get(&id).and_then(|e| e.supervisor());
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Restaurant ↔ Menu
    // -------------------------------------------------------------------------

    /// Attaches `menu` to `restaurant`, moving it off any other restaurant.
    pub fn add_menu(&mut self, restaurant: &str, menu: &str) -> CoreResult<Outcome> {
        self.set_menu_restaurant(menu, Some(restaurant))
    }

    /// Detaches `menu` from `restaurant`. `NotFound` when it is not there.
    pub fn remove_menu(&mut self, restaurant: &str, menu: &str) -> CoreResult<Outcome> {
        let attached = self
            .restaurants
            .get(restaurant)
            .ok_or_else(|| CoreError::unknown(EntityKind::Restaurant, restaurant))?
            .menus()
            .contains(&menu.to_string());

        if !attached {
            debug!(restaurant, menu, "Menu not attached");
            self.journal.record(DomainEvent::MenuRemoved {
                restaurant: restaurant.to_string(),
                menu: menu.to_string(),
                outcome: Outcome::NotFound,
            });
            return Ok(Outcome::NotFound);
        }

        self.set_menu_restaurant(menu, None)?;
        self.journal.record(DomainEvent::MenuRemoved {
            restaurant: restaurant.to_string(),
            menu: menu.to_string(),
            outcome: Outcome::Applied,
        });
        Ok(Outcome::Applied)
    }

    fn set_menu_restaurant(&mut self, menu: &str, restaurant: Option<&str>) -> CoreResult<Outcome> {
        let current = self
            .menus
            .get(menu)
            .ok_or_else(|| CoreError::unknown(EntityKind::Menu, menu))?
            .restaurant()
            .map(str::to_string);
        if let Some(target) = restaurant {
            self.require_restaurant_mut(target)?;
        }

        let (from, to) = match Relink::plan(current, restaurant.map(str::to_string)) {
            Relink::Unchanged => return Ok(Outcome::Unchanged),
            Relink::Move { from, to } => (from, to),
        };

        let key = menu.to_string();
        if let Some(old) = from.as_ref().and_then(|name| self.restaurants.get_mut(name)) {
            old.menus_mut().remove(&key);
        }
        if let Some(m) = self.menus.get_mut(menu) {
            m.set_restaurant(to.clone());
        }
        if let Some(new) = to.as_ref().and_then(|name| self.restaurants.get_mut(name)) {
            new.menus_mut().insert(key.clone());
        }

        debug!(menu, ?from, ?to, "Menu restaurant changed");
        self.journal
            .record(DomainEvent::MenuRestaurantChanged { menu: key, from, to });
        Ok(Outcome::Applied)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
