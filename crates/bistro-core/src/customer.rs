//! # Customers, Roles and Reservations
//!
//! ## Customer Role
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Customer Role                                    │
//! │                                                                         │
//! │  Role::Member { credit_points }        Role::NonMember                  │
//! │  ──────────────────────────────        ───────────────                  │
//! │  • accrues points when ordering        • no rewards                     │
//! │  • redeems points when paying          • pays full amount               │
//! │                                                                         │
//! │  Closed set: every role-dependent branch is an exhaustive match.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A customer's orders and reservations are reverse collections. They are
//! readable here and written only by the registry's association manager.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::association::LinkSet;
use crate::types::{CustomerId, OrderId, ReservationId};

// =============================================================================
// Role
// =============================================================================

/// Reward-program membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum Role {
    Member { credit_points: u32 },
    NonMember,
}

impl Role {
    /// A fresh member with no points.
    pub const fn member() -> Self {
        Role::Member { credit_points: 0 }
    }

    pub const fn is_member(&self) -> bool {
        matches!(self, Role::Member { .. })
    }

    /// Point balance, or `None` for non-members.
    pub const fn credit_points(&self) -> Option<u32> {
        match self {
            Role::Member { credit_points } => Some(*credit_points),
            Role::NonMember => None,
        }
    }

    /// Adds points to a member's balance (saturating). Returns the new
    /// balance, `None` for non-members.
    pub fn accrue(&mut self, points: u32) -> Option<u32> {
        match self {
            Role::Member { credit_points } => {
                *credit_points = credit_points.saturating_add(points);
                Some(*credit_points)
            }
            Role::NonMember => None,
        }
    }

    /// Spends up to `requested` points. Returns how many were actually used;
    /// the balance never goes below zero.
    pub fn use_credits(&mut self, requested: u32) -> u32 {
        match self {
            Role::Member { credit_points } => {
                let used = requested.min(*credit_points);
                *credit_points -= used;
                used
            }
            Role::NonMember => 0,
        }
    }

    /// Short label for narration.
    pub const fn label(&self) -> &'static str {
        match self {
            Role::Member { .. } => "member",
            Role::NonMember => "non-member",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::NonMember
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A restaurant guest.
///
/// Identity is the customer id.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    id: CustomerId,
    role: Role,
    /// Car registration handed to the valet, if any.
    car: Option<String>,
    orders: LinkSet<OrderId>,
    reservations: BTreeSet<ReservationId>,
}

impl Customer {
    pub fn new(id: CustomerId, role: Role) -> Self {
        Customer {
            id,
            role,
            car: None,
            orders: LinkSet::default(),
            reservations: BTreeSet::new(),
        }
    }

    pub fn with_car(mut self, car: impl Into<String>) -> Self {
        self.car = Some(car.into());
        self
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn car(&self) -> Option<&str> {
        self.car.as_deref()
    }

    /// Orders placed by (or assigned to) this customer.
    pub fn orders(&self) -> &LinkSet<OrderId> {
        &self.orders
    }

    /// Reservation keys held by this customer, ascending.
    pub fn reservations(&self) -> impl Iterator<Item = ReservationId> + '_ {
        self.reservations.iter().copied()
    }

    pub fn has_reservation(&self, id: ReservationId) -> bool {
        self.reservations.contains(&id)
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    pub(crate) fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    pub(crate) fn orders_mut(&mut self) -> &mut LinkSet<OrderId> {
        &mut self.orders
    }

    pub(crate) fn reservations_mut(&mut self) -> &mut BTreeSet<ReservationId> {
        &mut self.reservations
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Customer {}

impl Hash for Customer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// A table reservation, held by at most one customer at a time.
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    id: ReservationId,
    party_size: u16,
    customer: Option<CustomerId>,
}

impl Reservation {
    pub fn new(id: ReservationId, party_size: u16) -> Self {
        Reservation {
            id,
            party_size,
            customer: None,
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn party_size(&self) -> u16 {
        self.party_size
    }

    pub fn customer(&self) -> Option<CustomerId> {
        self.customer
    }

    pub(crate) fn set_customer(&mut self, customer: Option<CustomerId>) {
        self.customer = customer;
    }
}

impl PartialEq for Reservation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Reservation {}

impl Hash for Reservation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
