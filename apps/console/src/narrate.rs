//! # Narration
//!
//! Turns the core's event journal into something a person (or a log
//! pipeline) can read.
//!
//! ```text
//! Registry::drain_events() ──► Transcript ──► render(Text) ──► "#  3 Order 1 ..."
//!        CoreError ──────────►    │
//!                                 └─────────► render(Json) ──► {"event":...}
//! ```

use std::fmt::Display;

use bistro_core::{CoreError, DomainEvent, ItemChange, Outcome, RecordedEvent};
use serde::Serialize;

use crate::config::OutputFormat;
use crate::error::{AppResult, ErrorCode};

/// A command the walkthrough expected to fail, and how it failed.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub action: String,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Event(RecordedEvent),
    Rejected(Rejection),
}

/// Everything that happened during a run, in order.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn record_events(&mut self, events: Vec<RecordedEvent>) {
        self.entries.extend(events.into_iter().map(Entry::Event));
    }

    pub fn record_rejection(&mut self, action: impl Into<String>, err: &CoreError) {
        self.entries.push(Entry::Rejected(Rejection {
            action: action.into(),
            code: err.category().into(),
            message: err.to_string(),
        }));
    }

    pub fn rejections(&self) -> impl Iterator<Item = &Rejection> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Rejected(r) => Some(r),
            Entry::Event(_) => None,
        })
    }

    pub fn render(&self, format: OutputFormat) -> AppResult<String> {
        let mut out = String::new();
        for entry in &self.entries {
            let line = match format {
                OutputFormat::Text => render_text(entry),
                OutputFormat::Json => serde_json::to_string(entry)?,
            };
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

fn render_text(entry: &Entry) -> String {
    match entry {
        Entry::Event(recorded) => format!("#{:>3} {}", recorded.sequence, describe(&recorded.event)),
        Entry::Rejected(r) => format!("  ✗ {}: [{}] {}", r.action, r.code, r.message),
    }
}

fn link_change<K: Display>(subject: String, owner: &str, from: &Option<K>, to: &Option<K>) -> String {
    match (from, to) {
        (None, Some(to)) => format!("{} assigned to {} {}", subject, owner, to),
        (Some(from), Some(to)) => format!("{} moved from {} {} to {} {}", subject, owner, from, owner, to),
        (Some(from), None) => format!("{} released by {} {}", subject, owner, from),
        (None, None) => format!("{} has no {}", subject, owner),
    }
}

fn outcome_suffix(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Applied => "",
        Outcome::Unchanged => " (unchanged)",
        Outcome::NotFound => " (not found)",
        Outcome::DuplicateKey => " (duplicate key, ignored)",
    }
}

/// One sentence per event.
pub fn describe(event: &DomainEvent) -> String {
    match event {
        DomainEvent::RoleSwitched { customer, role } => {
            format!("Customer {} is now a {}", customer, role)
        }
        DomainEvent::OrderCustomerChanged { order, from, to } => {
            link_change(format!("Order {}", order), "customer", from, to)
        }
        DomainEvent::PaymentOrderChanged { payment, from, to } => {
            link_change(format!("Payment {}", payment), "order", from, to)
        }
        DomainEvent::ReservationAdded {
            customer,
            reservation,
            outcome,
        } => format!(
            "Customer {} takes reservation {}{}",
            customer,
            reservation,
            outcome_suffix(*outcome)
        ),
        DomainEvent::ReservationRemoved {
            customer,
            reservation,
            outcome,
        } => format!(
            "Customer {} gives up reservation {}{}",
            customer,
            reservation,
            outcome_suffix(*outcome)
        ),
        DomainEvent::SupervisorChanged { employee, from, to } => {
            link_change(format!("Employee {}", employee), "supervisor", from, to)
        }
        DomainEvent::SubordinateRemoved {
            supervisor,
            employee,
            outcome,
        } => format!(
            "Employee {} no longer reports to {}{}",
            employee,
            supervisor,
            outcome_suffix(*outcome)
        ),
        DomainEvent::MenuRestaurantChanged { menu, from, to } => {
            link_change(format!("Menu '{}'", menu), "restaurant", from, to)
        }
        DomainEvent::MenuRemoved {
            restaurant,
            menu,
            outcome,
        } => format!(
            "Menu '{}' taken off '{}'{}",
            menu,
            restaurant,
            outcome_suffix(*outcome)
        ),
        DomainEvent::TableAdded {
            restaurant,
            table,
            outcome,
        } => format!(
            "Table {} set up in '{}'{}",
            table,
            restaurant,
            outcome_suffix(*outcome)
        ),
        DomainEvent::TableRemoved {
            restaurant,
            table,
            outcome,
        } => format!(
            "Table {} cleared from '{}'{}",
            table,
            restaurant,
            outcome_suffix(*outcome)
        ),
        DomainEvent::ItemAdded {
            order,
            dish,
            added,
            change,
        } => match change {
            ItemChange::Added { .. } => {
                format!("Order {}: {} × dish {} added", order, added, dish)
            }
            ItemChange::Merged { previous, quantity } => format!(
                "Order {}: dish {} now × {} (was {})",
                order, dish, quantity, previous
            ),
        },
        DomainEvent::ItemQuantityChanged {
            order,
            dish,
            previous,
            quantity,
        } => format!(
            "Order {}: dish {} now × {} (was {})",
            order, dish, quantity, previous
        ),
        DomainEvent::ItemRemoved {
            order,
            dish,
            outcome,
        } => format!(
            "Order {}: dish {} removed{}",
            order,
            dish,
            outcome_suffix(*outcome)
        ),
        DomainEvent::RewardsAccrued {
            customer,
            points,
            balance,
        } => format!(
            "Customer {} earned {} points (balance {})",
            customer, points, balance
        ),
        DomainEvent::CreditsRedeemed {
            customer,
            requested,
            used,
            balance,
        } => format!(
            "Customer {} redeemed {} of {} credits (balance {})",
            customer, used, requested, balance
        ),
        DomainEvent::OrderPlaced {
            order,
            customer,
            dishes,
            total,
        } => format!(
            "Customer {} placed order {}: {} dishes, total {}",
            customer, order, dishes, total
        ),
        DomainEvent::PaymentProcessed {
            payment,
            order,
            amount,
            method,
        } => format!(
            "Payment {} of {} by {} completed for order {}",
            payment, amount, method, order
        ),
        DomainEvent::PaymentRefunded { payment, amount } => {
            format!("Payment {} refunded ({})", payment, amount)
        }
        DomainEvent::CarParked {
            valet,
            customer,
            car,
            outcome,
        } => format!(
            "Valet {} parks '{}' for customer {}{}",
            valet,
            car,
            customer,
            outcome_suffix(*outcome)
        ),
        DomainEvent::CarRetrieved {
            valet,
            customer,
            car,
            outcome,
        } => format!(
            "Valet {} brings '{}' back to customer {}{}",
            valet,
            car,
            customer,
            outcome_suffix(*outcome)
        ),
    }
}
