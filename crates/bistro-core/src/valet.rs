//! # Valet Parking
//!
//! Valets take the car of an arriving customer and bring it back on the way
//! out. Only customers with a car on file can be served.
//!
//! ## Car Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Valet Service                                   │
//! │                                                                         │
//! │   Customer (car on file)                                                │
//! │        │                                                                │
//! │        │ park_car(valet, customer)                                      │
//! │        ▼                                                                │
//! │   ┌──────────┐  park again (same valet)  ──► Unchanged                  │
//! │   │  PARKED  │  park with another valet  ──► CarWithAnotherValet        │
//! │   └────┬─────┘                                                          │
//! │        │ retrieve_car(valet, customer)                                  │
//! │        ▼                                                                │
//! │   handed back ──► Applied   (car not held by this valet ──► NotFound)   │
//! │                                                                         │
//! │   No car on file ──► NoCar, nothing recorded                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::events::DomainEvent;
use crate::registry::Registry;
use crate::types::{CustomerId, EntityKind, Outcome, ValetId};
use crate::validation::validate_name;

/// A valet stationed at one location.
///
/// Identity is (valet id, assigned location).
#[derive(Debug, Clone, Serialize)]
pub struct Valet {
    id: ValetId,
    location: String,
    /// Customers whose car this valet currently holds.
    parked: BTreeSet<CustomerId>,
}

impl Valet {
    pub fn new(id: ValetId, location: impl Into<String>) -> Self {
        Valet {
            id,
            location: location.into(),
            parked: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ValetId {
        self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn holds_car_of(&self, customer: CustomerId) -> bool {
        self.parked.contains(&customer)
    }

    pub fn parked_count(&self) -> usize {
        self.parked.len()
    }
}

impl PartialEq for Valet {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.location == other.location
    }
}

impl Eq for Valet {}

impl Hash for Valet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.location.hash(state);
    }
}

// =============================================================================
// Registry Valet Commands
// =============================================================================

impl Registry {
    pub fn register_valet(&mut self, valet: Valet) -> CoreResult<ValetId> {
        validate_name("assigned location", valet.location(), 3, 100)?;
        let id = valet.id();
        if self.valets.contains_key(&id) {
            return Err(CoreError::duplicate(EntityKind::Valet, id));
        }
        debug!(valet = %id, location = valet.location(), "Registering valet");
        self.valets.insert(id, valet);
        Ok(id)
    }

    pub fn valet(&self, id: ValetId) -> Option<&Valet> {
        self.valets.get(&id)
    }

    pub fn valets(&self) -> impl Iterator<Item = &Valet> {
        self.valets.values()
    }

    /// Hands the customer's car to `valet`.
    ///
    /// ## Errors
    /// - `NoCar`: the customer has no (non-blank) car on file
    /// - `CarWithAnotherValet`: a different valet already holds the car
    pub fn park_car(&mut self, valet: ValetId, customer: CustomerId) -> CoreResult<Outcome> {
        let car = self.car_of(customer)?;
        self.require_valet(valet)?;

        if let Some(holder) = self
            .valets
            .values()
            .find(|v| v.id != valet && v.holds_car_of(customer))
        {
            return Err(CoreError::CarWithAnotherValet {
                customer,
                valet: holder.id,
            });
        }

        let target = self.require_valet_mut(valet)?;
        let outcome = if target.parked.insert(customer) {
            Outcome::Applied
        } else {
            Outcome::Unchanged
        };

        debug!(%valet, %customer, car = %car, ?outcome, "Car parked");
        self.journal.record(DomainEvent::CarParked {
            valet,
            customer,
            car,
            outcome,
        });
        Ok(outcome)
    }

    /// Brings the customer's car back from `valet`. `NotFound` when this
    /// valet does not hold it.
    pub fn retrieve_car(&mut self, valet: ValetId, customer: CustomerId) -> CoreResult<Outcome> {
        let car = self.car_of(customer)?;

        let target = self.require_valet_mut(valet)?;
        let outcome = if target.parked.remove(&customer) {
            Outcome::Applied
        } else {
            Outcome::NotFound
        };

        debug!(%valet, %customer, car = %car, ?outcome, "Car retrieval");
        self.journal.record(DomainEvent::CarRetrieved {
            valet,
            customer,
            car,
            outcome,
        });
        Ok(outcome)
    }

    fn car_of(&self, customer: CustomerId) -> CoreResult<String> {
        self.require_customer(customer)?
            .car()
            .map(str::trim)
            .filter(|car| !car.is_empty())
            .map(str::to_string)
            .ok_or(CoreError::NoCar { customer })
    }

    fn require_valet(&self, id: ValetId) -> CoreResult<&Valet> {
        self.valets
            .get(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Valet, id))
    }

    fn require_valet_mut(&mut self, id: ValetId) -> CoreResult<&mut Valet> {
        self.valets
            .get_mut(&id)
            .ok_or_else(|| CoreError::unknown(EntityKind::Valet, id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::{Customer, Role};
    use crate::error::ErrorCategory;

    const FRONT: ValetId = ValetId::new(1);
    const GARAGE: ValetId = ValetId::new(2);
    const DRIVER: CustomerId = CustomerId::new(1);
    const WALKER: CustomerId = CustomerId::new(2);

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_customer(Customer::new(DRIVER, Role::member()).with_car("WX 1234"))
            .unwrap();
        registry
            .register_customer(Customer::new(WALKER, Role::NonMember))
            .unwrap();
        registry.register_valet(Valet::new(FRONT, "Front door")).unwrap();
        registry.register_valet(Valet::new(GARAGE, "Garage")).unwrap();
        registry
    }

    #[test]
    fn test_identity_is_id_and_location() {
        assert_eq!(Valet::new(FRONT, "Front door"), Valet::new(FRONT, "Front door"));
        assert_ne!(Valet::new(FRONT, "Front door"), Valet::new(FRONT, "Garage"));
        assert_ne!(Valet::new(FRONT, "Garage"), Valet::new(GARAGE, "Garage"));
    }

    #[test]
    fn test_location_is_validated() {
        let mut registry = Registry::new();
        let err = registry.register_valet(Valet::new(FRONT, "Up")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);

        registry.register_valet(Valet::new(FRONT, "Lobby")).unwrap();
        let err = registry.register_valet(Valet::new(FRONT, "Garage")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::DuplicateKey);
    }

    #[test]
    fn test_park_and_retrieve() {
        let mut registry = registry();

        assert_eq!(registry.park_car(FRONT, DRIVER).unwrap(), Outcome::Applied);
        assert_eq!(registry.park_car(FRONT, DRIVER).unwrap(), Outcome::Unchanged);
        assert!(registry.valet(FRONT).unwrap().holds_car_of(DRIVER));

        assert_eq!(registry.retrieve_car(GARAGE, DRIVER).unwrap(), Outcome::NotFound);
        assert_eq!(registry.retrieve_car(FRONT, DRIVER).unwrap(), Outcome::Applied);
        assert_eq!(registry.valet(FRONT).unwrap().parked_count(), 0);

        let events = registry.drain_events();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0].event,
            DomainEvent::CarParked { car, outcome: Outcome::Applied, .. } if car == "WX 1234"
        ));
    }

    #[test]
    fn test_customer_without_car_is_refused() {
        let mut registry = registry();

        let err = registry.park_car(FRONT, WALKER).unwrap_err();
        assert!(matches!(err, CoreError::NoCar { customer } if customer == WALKER));
        assert_eq!(err.category(), ErrorCategory::InvalidState);
        assert!(registry.retrieve_car(FRONT, WALKER).is_err());

        let blank = CustomerId::new(3);
        registry
            .register_customer(Customer::new(blank, Role::NonMember).with_car("   "))
            .unwrap();
        assert!(registry.park_car(FRONT, blank).is_err());

        assert!(registry.events().is_empty());
        assert_eq!(registry.valet(FRONT).unwrap().parked_count(), 0);
    }

    #[test]
    fn test_car_held_by_one_valet_at_a_time() {
        let mut registry = registry();
        registry.park_car(FRONT, DRIVER).unwrap();

        let err = registry.park_car(GARAGE, DRIVER).unwrap_err();
        assert!(matches!(err, CoreError::CarWithAnotherValet { valet, .. } if valet == FRONT));
        assert!(!registry.valet(GARAGE).unwrap().holds_car_of(DRIVER));
        assert!(registry.park_car(ValetId::new(9), DRIVER).is_err());
    }
}
