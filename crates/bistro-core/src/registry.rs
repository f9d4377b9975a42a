//! # Registry
//!
//! Owns every entity and is the only place two entities are mutated together.
//!
//! ## Ownership Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Registry                                      │
//! │                                                                         │
//! │  customers ─┐   orders ─┐   payments ─┐   reservations                 │
//! │  employees  │   menus   │   restaurants│   valets                      │
//! │             │           │             │                                 │
//! │  Entities refer to each other by KEY (CustomerId, OrderId, ...).        │
//! │  No entity owns another across an association, so there are no         │
//! │  ownership cycles between Customer ↔ Order ↔ Payment.                  │
//! │                                                                         │
//! │  Command split:                                                         │
//! │  • registry.rs     registration, lookups, line items, tables            │
//! │  • association.rs  two-sided links                                     │
//! │  • flow.rs         place_order / make_payment                           │
//! │  • valet.rs        park_car / retrieve_car                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `&mut self` command is one atomic step: it validates everything it
//! needs first and mutates only after nothing else can fail.

use std::collections::BTreeMap;
use std::fmt::Display;

use tracing::debug;

use crate::customer::{Customer, Reservation};
use crate::employee::Employee;
use crate::error::{CoreError, CoreResult};
use crate::events::{DomainEvent, EventJournal, RecordedEvent};
use crate::flow::RewardPolicy;
use crate::menu::{Dish, Menu};
use crate::money::Money;
use crate::order::{ItemChange, Order};
use crate::payment::Payment;
use crate::restaurant::{Restaurant, Table};
use crate::types::{
    CustomerId, DishId, EmployeeId, EntityKind, OrderId, Outcome, PaymentId, ReservationId,
    TableId, ValetId,
};
use crate::valet::Valet;
use crate::validation::{validate_capacity, validate_name, validate_party_size, validate_price};

/// In-memory home of the entity graph.
#[derive(Debug, Default)]
pub struct Registry {
    pub(crate) customers: BTreeMap<CustomerId, Customer>,
    pub(crate) orders: BTreeMap<OrderId, Order>,
    pub(crate) payments: BTreeMap<PaymentId, Payment>,
    pub(crate) reservations: BTreeMap<ReservationId, Reservation>,
    pub(crate) employees: BTreeMap<EmployeeId, Employee>,
    pub(crate) restaurants: BTreeMap<String, Restaurant>,
    pub(crate) menus: BTreeMap<String, Menu>,
    pub(crate) valets: BTreeMap<ValetId, Valet>,
    pub(crate) policy: RewardPolicy,
    pub(crate) journal: EventJournal,
}

fn insert_unique<K, V>(
    map: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    kind: EntityKind,
) -> CoreResult<K>
where
    K: Ord + Clone + Display,
{
    if map.contains_key(&key) {
        return Err(CoreError::duplicate(kind, &key));
    }
    debug!(%kind, key = %key, "Registering entity");
    map.insert(key.clone(), value);
    Ok(key)
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry using a non-default reward policy.
    pub fn with_policy(policy: RewardPolicy) -> Self {
        Registry {
            policy,
            ..Self::default()
        }
    }

    /// Replaces the journal with an empty one bounded at `capacity` events.
    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.journal = EventJournal::with_capacity(capacity);
        self
    }

    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub fn register_customer(&mut self, customer: Customer) -> CoreResult<CustomerId> {
        insert_unique(&mut self.customers, customer.id(), customer, EntityKind::Customer)
    }

    pub fn register_order(&mut self, order: Order) -> CoreResult<OrderId> {
        insert_unique(&mut self.orders, order.id(), order, EntityKind::Order)
    }

    pub fn register_payment(&mut self, payment: Payment) -> CoreResult<PaymentId> {
        insert_unique(&mut self.payments, payment.id(), payment, EntityKind::Payment)
    }

    pub fn register_reservation(&mut self, reservation: Reservation) -> CoreResult<ReservationId> {
        validate_party_size(reservation.party_size())?;
        insert_unique(
            &mut self.reservations,
            reservation.id(),
            reservation,
            EntityKind::Reservation,
        )
    }

    pub fn register_employee(&mut self, employee: Employee) -> CoreResult<EmployeeId> {
        validate_name("department", employee.department(), 2, 100)?;
        employee.check_dates()?;
        insert_unique(&mut self.employees, employee.id(), employee, EntityKind::Employee)
    }

    pub fn register_restaurant(&mut self, restaurant: Restaurant) -> CoreResult<String> {
        validate_name("restaurant name", restaurant.name(), 2, 100)?;
        validate_capacity(restaurant.max_capacity())?;
        let name = restaurant.name().to_string();
        insert_unique(&mut self.restaurants, name, restaurant, EntityKind::Restaurant)
    }

    pub fn register_menu(&mut self, menu: Menu) -> CoreResult<String> {
        validate_name("menu name", menu.name(), 1, 100)?;
        for dish in menu.dishes() {
            validate_name("dish name", &dish.name, 1, 100)?;
            validate_price(dish.price)?;
        }
        let name = menu.name().to_string();
        insert_unique(&mut self.menus, name, menu, EntityKind::Menu)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.get(&id)
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.get(&id)
    }

    pub fn reservation(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.get(&id)
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.get(&id)
    }

    pub fn restaurant(&self, name: &str) -> Option<&Restaurant> {
        self.restaurants.get(name)
    }

    pub fn menu(&self, name: &str) -> Option<&Menu> {
        self.menus.get(name)
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.payments.values()
    }

    pub fn employees(&self) -> impl Iterator<Item = &Employee> {
        self.employees.values()
    }

    pub fn restaurants(&self) -> impl Iterator<Item = &Restaurant> {
        self.restaurants.values()
    }

    pub fn menus(&self) -> impl Iterator<Item = &Menu> {
        self.menus.values()
    }

    /// The customer's orders, in the order they were linked.
    pub fn orders_of(&self, customer: CustomerId) -> CoreResult<Vec<&Order>> {
        let customer = self.require_customer(customer)?;
        Ok(customer
            .orders()
            .iter()
            .filter_map(|id| self.orders.get(id))
            .collect())
    }

    /// The customer's reservations, ascending by key.
    pub fn reservations_of(&self, customer: CustomerId) -> CoreResult<Vec<&Reservation>> {
        let customer = self.require_customer(customer)?;
        Ok(customer
            .reservations()
            .filter_map(|id| self.reservations.get(&id))
            .collect())
    }

    /// Total of an order (see [`Order::calculate_total`]).
    pub fn order_total(&self, order: OrderId) -> CoreResult<Money> {
        Ok(self.require_order(order)?.calculate_total())
    }

    // =========================================================================
    // Event Journal
    // =========================================================================

    /// Undrained events, oldest first. The journal is bounded (see
    /// [`EventJournal::with_capacity`]), so callers drain it as they go.
    pub fn events(&self) -> &[RecordedEvent] {
        self.journal.pending()
    }

    pub fn drain_events(&mut self) -> Vec<RecordedEvent> {
        self.journal.drain()
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    // =========================================================================
    // Line Items
    // =========================================================================

    pub fn add_item(&mut self, order: OrderId, dish: &Dish, quantity: u32) -> CoreResult<ItemChange> {
        let change = self.require_order_mut(order)?.add_item(dish, quantity)?;

        debug!(%order, dish = %dish.id, quantity, line_quantity = change.quantity(), "Item added");
        self.journal.record(DomainEvent::ItemAdded {
            order,
            dish: dish.id,
            added: quantity,
            change,
        });
        Ok(change)
    }

    pub fn remove_item(&mut self, order: OrderId, dish: DishId) -> CoreResult<Outcome> {
        let outcome = self.require_order_mut(order)?.remove_item(dish);

        debug!(%order, %dish, ?outcome, "Item removal");
        self.journal.record(DomainEvent::ItemRemoved {
            order,
            dish,
            outcome,
        });
        Ok(outcome)
    }

    pub fn set_item_quantity(&mut self, order: OrderId, dish: DishId, quantity: u32) -> CoreResult<()> {
        let previous = self.require_order_mut(order)?.set_item_quantity(dish, quantity)?;

        debug!(%order, %dish, previous, quantity, "Item quantity set");
        self.journal.record(DomainEvent::ItemQuantityChanged {
            order,
            dish,
            previous,
            quantity,
        });
        Ok(())
    }

    /// Takes units off a line item. Returns the remaining quantity.
    pub fn reduce_item(&mut self, order: OrderId, dish: DishId, quantity: u32) -> CoreResult<u32> {
        let remaining = self.require_order_mut(order)?.reduce_item(dish, quantity)?;

        debug!(%order, %dish, quantity, remaining, "Item quantity reduced");
        let event = if remaining == 0 {
            DomainEvent::ItemRemoved {
                order,
                dish,
                outcome: Outcome::Applied,
            }
        } else {
            DomainEvent::ItemQuantityChanged {
                order,
                dish,
                previous: remaining + quantity,
                quantity: remaining,
            }
        };
        self.journal.record(event);
        Ok(remaining)
    }

    // =========================================================================
    // Tables
    // =========================================================================

    pub fn add_table(&mut self, restaurant: &str, table: Table) -> CoreResult<Outcome> {
        let table_id = table.id;
        let outcome = self.require_restaurant_mut(restaurant)?.add_table(table)?;

        debug!(restaurant, table = %table_id, ?outcome, "Table added");
        self.journal.record(DomainEvent::TableAdded {
            restaurant: restaurant.to_string(),
            table: table_id,
            outcome,
        });
        Ok(outcome)
    }

    pub fn remove_table(&mut self, restaurant: &str, table: TableId) -> CoreResult<Outcome> {
        let outcome = self.require_restaurant_mut(restaurant)?.remove_table(table);

        debug!(restaurant, %table, ?outcome, "Table removal");
        self.journal.record(DomainEvent::TableRemoved {
            restaurant: restaurant.to_string(),
            table,
            outcome,
        });
        Ok(outcome)
    }

    // =========================================================================
    // Required Lookups
    // =========================================================================

    pub(crate) fn require_customer(&self, id: CustomerId) -> CoreResult<&Customer> {
        self.customers
            .get(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Customer, id))
    }

    pub(crate) fn require_customer_mut(&mut self, id: CustomerId) -> CoreResult<&mut Customer> {
        self.customers
            .get_mut(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Customer, id))
    }

    pub(crate) fn require_order(&self, id: OrderId) -> CoreResult<&Order> {
        self.orders
            .get(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Order, id))
    }

    pub(crate) fn require_order_mut(&mut self, id: OrderId) -> CoreResult<&mut Order> {
        self.orders
            .get_mut(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Order, id))
    }

    pub(crate) fn require_payment(&self, id: PaymentId) -> CoreResult<&Payment> {
        self.payments
            .get(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Payment, id))
    }

    pub(crate) fn require_payment_mut(&mut self, id: PaymentId) -> CoreResult<&mut Payment> {
        self.payments
            .get_mut(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Payment, id))
    }

    pub(crate) fn require_employee(&self, id: EmployeeId) -> CoreResult<&Employee> {
        self.employees
            .get(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Employee, id))
    }

    pub(crate) fn require_restaurant_mut(&mut self, name: &str) -> CoreResult<&mut Restaurant> {
        self.restaurants
            .get_mut(name)
            .ok_or_else(|| CoreError::unknown(EntityKind::Restaurant, name))
    }

    /// Next free order key: one past the highest, or the lowest gap once the
    /// highest is `u32::MAX`.
    pub(crate) fn next_order_id(&self) -> CoreResult<OrderId> {
        free_key(
            &self.orders,
            OrderId::new(1),
            OrderId::checked_next,
            EntityKind::Order,
        )
    }

    /// Next free payment key, allocated like [`Registry::next_order_id`].
    pub(crate) fn next_payment_id(&self) -> CoreResult<PaymentId> {
        free_key(
            &self.payments,
            PaymentId::new(1),
            PaymentId::checked_next,
            EntityKind::Payment,
        )
    }
}

fn free_key<K, V>(
    map: &BTreeMap<K, V>,
    first: K,
    next: fn(&K) -> Option<K>,
    kind: EntityKind,
) -> CoreResult<K>
where
    K: Ord + Copy,
{
    let Some(last) = map.keys().next_back() else {
        return Ok(first);
    };
    if let Some(key) = next(last) {
        return Ok(key);
    }

    let mut candidate = first;
    for key in map.keys() {
        if *key > candidate {
            return Ok(candidate);
        }
        if *key == candidate {
            candidate = next(&candidate).ok_or(CoreError::KeysExhausted { kind })?;
        }
    }
    Ok(candidate)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::Role;
    use crate::error::ErrorCategory;
    use crate::types::PaymentMethod;
    use chrono::NaiveDate;

    fn soda() -> Dish {
        Dish::new(DishId::new(2), "Soda", Money::from_cents(200))
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry
            .register_customer(Customer::new(CustomerId::new(1), Role::NonMember))
            .unwrap();

        let err = registry
            .register_customer(Customer::new(CustomerId::new(1), Role::member()))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::DuplicateKey);
        assert!(!registry.customer(CustomerId::new(1)).unwrap().role().is_member());
    }

    #[test]
    fn test_registration_validates_fields() {
        let mut registry = Registry::new();
        let err = registry
            .register_restaurant(Restaurant::new("Empty", 0))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert!(registry
            .register_reservation(Reservation::new(ReservationId::new(1), 0))
            .is_err());
        assert!(registry.restaurant("Empty").is_none());
    }

    #[test]
    fn test_employee_leaving_before_hire_not_registered() {
        let mut registry = Registry::new();
        let hired = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let left = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();

        let err = registry
            .register_employee(
                Employee::new(EmployeeId::new(1), hired, "Kitchen").with_leaving_date(left),
            )
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert!(registry.employee(EmployeeId::new(1)).is_none());
    }

    #[test]
    fn test_id_allocation_follows_highest_key() {
        let mut registry = Registry::new();
        assert_eq!(registry.next_order_id().unwrap(), OrderId::new(1));

        registry.register_order(Order::new(OrderId::new(10))).unwrap();
        assert_eq!(registry.next_order_id().unwrap(), OrderId::new(11));
    }

    #[test]
    fn test_id_allocation_falls_back_to_lowest_gap() {
        let mut registry = Registry::new();
        for raw in [1, 2, 4, u32::MAX] {
            registry.register_order(Order::new(OrderId::new(raw))).unwrap();
        }
        assert_eq!(registry.next_order_id().unwrap(), OrderId::new(3));

        let payment = Payment::new(
            PaymentId::new(u32::MAX),
            Money::from_cents(100),
            PaymentMethod::Cash,
        )
        .unwrap();
        registry.register_payment(payment).unwrap();
        assert_eq!(registry.next_payment_id().unwrap(), PaymentId::new(1));
    }

    #[test]
    fn test_key_search_reports_exhaustion() {
        let keys: BTreeMap<OrderId, ()> = [(OrderId::new(u32::MAX), ())].into_iter().collect();
        let found = free_key(
            &keys,
            OrderId::new(u32::MAX),
            OrderId::checked_next,
            EntityKind::Order,
        );
        assert!(matches!(
            found,
            Err(CoreError::KeysExhausted {
                kind: EntityKind::Order
            })
        ));
    }

    #[test]
    fn test_item_commands_record_events() {
        let mut registry = Registry::new();
        let order = registry.register_order(Order::new(OrderId::new(1))).unwrap();

        registry.add_item(order, &soda(), 2).unwrap();
        registry.add_item(order, &soda(), 1).unwrap();
        assert_eq!(registry.remove_item(order, DishId::new(99)).unwrap(), Outcome::NotFound);

        assert_eq!(registry.order_total(order).unwrap(), Money::from_cents(600));

        let events = registry.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[1].event,
            DomainEvent::ItemAdded {
                change: ItemChange::Merged {
                    previous: 2,
                    quantity: 3
                },
                ..
            }
        ));
        assert!(matches!(
            events[2].event,
            DomainEvent::ItemRemoved {
                outcome: Outcome::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_failed_item_command_records_nothing() {
        let mut registry = Registry::new();
        let order = registry.register_order(Order::new(OrderId::new(1))).unwrap();

        assert!(registry.add_item(order, &soda(), 0).is_err());
        assert!(registry.add_item(OrderId::new(2), &soda(), 1).is_err());
        assert!(registry.events().is_empty());
    }

    #[test]
    fn test_reduce_item_to_zero_reports_removal() {
        let mut registry = Registry::new();
        let order = registry.register_order(Order::new(OrderId::new(1))).unwrap();
        registry.add_item(order, &soda(), 2).unwrap();
        registry.drain_events();

        assert_eq!(registry.reduce_item(order, DishId::new(2), 1).unwrap(), 1);
        assert_eq!(registry.reduce_item(order, DishId::new(2), 1).unwrap(), 0);

        let events = registry.drain_events();
        assert!(matches!(
            events[0].event,
            DomainEvent::ItemQuantityChanged {
                previous: 2,
                quantity: 1,
                ..
            }
        ));
        assert!(matches!(events[1].event, DomainEvent::ItemRemoved { .. }));
        assert!(registry.order(order).unwrap().is_empty());
    }

    #[test]
    fn test_tables_through_registry() {
        let mut registry = Registry::new();
        registry.register_restaurant(Restaurant::new("Da Mario", 1)).unwrap();

        let t1 = Table::new(TableId::new(1), 4);
        assert_eq!(registry.add_table("Da Mario", t1).unwrap(), Outcome::Applied);
        assert!(registry
            .add_table("Da Mario", Table::new(TableId::new(2), 2))
            .is_err());
        assert_eq!(
            registry.remove_table("Da Mario", TableId::new(5)).unwrap(),
            Outcome::NotFound
        );
        assert!(registry.add_table("Nowhere", Table::new(TableId::new(1), 2)).is_err());
    }
}
