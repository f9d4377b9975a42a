//! # Dishes and Menus
//!
//! A [`Dish`] is the unit customers order; a [`Menu`] is a named list of
//! dishes that belongs to at most one restaurant.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::money::Money;
use crate::types::{DishId, Outcome};

// =============================================================================
// Dish
// =============================================================================

/// A dish that can be ordered.
///
/// Identity is the dish id alone: two `Dish` values with the same id are the
/// same dish even if one carries a stale name or price. Line items merge on
/// this identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
    pub price: Money,
}

impl Dish {
    pub fn new(id: DishId, name: impl Into<String>, price: Money) -> Self {
        Dish {
            id,
            name: name.into(),
            price,
        }
    }
}

impl PartialEq for Dish {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Dish {}

impl Hash for Dish {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// Menu
// =============================================================================

/// A named list of dishes.
///
/// The owning restaurant is a back-reference maintained by the registry's
/// restaurant↔menu association; it cannot be set from outside the crate.
#[derive(Debug, Clone, Serialize)]
pub struct Menu {
    name: String,
    dishes: Vec<Dish>,
    restaurant: Option<String>,
}

impl Menu {
    pub fn new(name: impl Into<String>) -> Self {
        Menu {
            name: name.into(),
            dishes: Vec::new(),
            restaurant: None,
        }
    }

    /// Builder-style [`Menu::add_dish`] for assembling a menu before
    /// registration.
    pub fn with_dish(mut self, dish: Dish) -> Self {
        self.add_dish(dish);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the restaurant this menu is attached to.
    pub fn restaurant(&self) -> Option<&str> {
        self.restaurant.as_deref()
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn dish(&self, id: DishId) -> Option<&Dish> {
        self.dishes.iter().find(|d| d.id == id)
    }

    /// Adds a dish; a dish id already on the menu is reported, not replaced.
    pub fn add_dish(&mut self, dish: Dish) -> Outcome {
        if self.dishes.contains(&dish) {
            return Outcome::DuplicateKey;
        }
        self.dishes.push(dish);
        Outcome::Applied
    }

    pub fn remove_dish(&mut self, id: DishId) -> Outcome {
        match self.dishes.iter().position(|d| d.id == id) {
            Some(idx) => {
                self.dishes.remove(idx);
                Outcome::Applied
            }
            None => Outcome::NotFound,
        }
    }

    pub(crate) fn set_restaurant(&mut self, restaurant: Option<String>) {
        self.restaurant = restaurant;
    }
}

impl PartialEq for Menu {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Menu {}

impl Hash for Menu {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
