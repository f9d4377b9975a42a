//! # Domain Events
//!
//! Every mutating registry operation records what happened as a
//! [`DomainEvent`]. The core never prints; a presentation layer drains the
//! journal and renders it however it likes (text, JSON lines, a UI feed).
//!
//! ## Event Flow
//! ```text
//! Registry command ──► state change ──► EventJournal::record()
//!                                              │
//!                    caller ◄── drain() ◄──────┘
//! ```
//!
//! The journal is bounded. Once it holds its capacity, recording a new event
//! drops the oldest one, so long-running callers must drain it regularly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::money::Money;
use crate::order::ItemChange;
use crate::types::{
    CustomerId, DishId, EmployeeId, OrderId, Outcome, PaymentId, PaymentMethod, ReservationId,
    TableId, ValetId,
};
use crate::DEFAULT_JOURNAL_CAPACITY;

/// Something that happened to the entity graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum DomainEvent {
    RoleSwitched {
        customer: CustomerId,
        role: &'static str,
    },
    OrderCustomerChanged {
        order: OrderId,
        from: Option<CustomerId>,
        to: Option<CustomerId>,
    },
    PaymentOrderChanged {
        payment: PaymentId,
        from: Option<OrderId>,
        to: Option<OrderId>,
    },
    ReservationAdded {
        customer: CustomerId,
        reservation: ReservationId,
        outcome: Outcome,
    },
    ReservationRemoved {
        customer: CustomerId,
        reservation: ReservationId,
        outcome: Outcome,
    },
    SupervisorChanged {
        employee: EmployeeId,
        from: Option<EmployeeId>,
        to: Option<EmployeeId>,
    },
    SubordinateRemoved {
        supervisor: EmployeeId,
        employee: EmployeeId,
        outcome: Outcome,
    },
    MenuRestaurantChanged {
        menu: String,
        from: Option<String>,
        to: Option<String>,
    },
    MenuRemoved {
        restaurant: String,
        menu: String,
        outcome: Outcome,
    },
    TableAdded {
        restaurant: String,
        table: TableId,
        outcome: Outcome,
    },
    TableRemoved {
        restaurant: String,
        table: TableId,
        outcome: Outcome,
    },
    ItemAdded {
        order: OrderId,
        dish: DishId,
        added: u32,
        change: ItemChange,
    },
    ItemQuantityChanged {
        order: OrderId,
        dish: DishId,
        previous: u32,
        quantity: u32,
    },
    ItemRemoved {
        order: OrderId,
        dish: DishId,
        outcome: Outcome,
    },
    RewardsAccrued {
        customer: CustomerId,
        points: u32,
        balance: u32,
    },
    CreditsRedeemed {
        customer: CustomerId,
        requested: u32,
        used: u32,
        balance: u32,
    },
    OrderPlaced {
        order: OrderId,
        customer: CustomerId,
        dishes: usize,
        total: Money,
    },
    PaymentProcessed {
        payment: PaymentId,
        order: OrderId,
        amount: Money,
        method: PaymentMethod,
    },
    PaymentRefunded {
        payment: PaymentId,
        amount: Money,
    },
    CarParked {
        valet: ValetId,
        customer: CustomerId,
        car: String,
        outcome: Outcome,
    },
    CarRetrieved {
        valet: ValetId,
        customer: CustomerId,
        car: String,
        outcome: Outcome,
    },
}

/// A [`DomainEvent`] with its identity and time of recording.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedEvent {
    pub id: Uuid,
    /// Position in the journal, starting at 1.
    pub sequence: u64,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DomainEvent,
}

/// Bounded buffer of recorded events.
#[derive(Debug)]
pub struct EventJournal {
    events: Vec<RecordedEvent>,
    next_sequence: u64,
    capacity: usize,
    dropped: u64,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal holding at most `capacity` undrained events (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        EventJournal {
            events: Vec::new(),
            next_sequence: 0,
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded because the journal was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Appends `event`, evicting the oldest undrained event when full.
    pub fn record(&mut self, event: DomainEvent) {
        if self.events.len() >= self.capacity {
            let evicted = self.events.remove(0);
            self.dropped += 1;
            warn!(
                sequence = evicted.sequence,
                capacity = self.capacity,
                "Event journal full, dropping oldest event"
            );
        }

        self.next_sequence += 1;
        self.events.push(RecordedEvent {
            id: Uuid::new_v4(),
            sequence: self.next_sequence,
            at: Utc::now(),
            event,
        });
    }

    /// Events recorded since the last drain.
    pub fn pending(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Hands the buffered events to the caller. Sequence numbers keep
    /// counting across drains.
    pub fn drain(&mut self) -> Vec<RecordedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Renders the buffered events as newline-delimited JSON.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_survives_drain() {
        let mut journal = EventJournal::new();
        journal.record(DomainEvent::RoleSwitched {
            customer: CustomerId::new(1),
            role: "member",
        });
        let first = journal.drain();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].sequence, 1);
        assert!(journal.pending().is_empty());

        journal.record(DomainEvent::PaymentRefunded {
            payment: PaymentId::new(1),
            amount: Money::from_cents(100),
        });
        assert_eq!(journal.pending()[0].sequence, 2);
    }

    #[test]
    fn test_full_journal_drops_oldest() {
        let mut journal = EventJournal::with_capacity(2);
        for raw in 1..=3 {
            journal.record(DomainEvent::PaymentRefunded {
                payment: PaymentId::new(raw),
                amount: Money::from_cents(100),
            });
        }

        let sequences: Vec<u64> = journal.pending().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![2, 3]);
        assert_eq!(journal.dropped(), 1);

        journal.drain();
        assert!(journal.pending().is_empty());
        assert_eq!(EventJournal::with_capacity(0).capacity(), 1);
        assert_eq!(EventJournal::new().capacity(), DEFAULT_JOURNAL_CAPACITY);
    }

    #[test]
    fn test_json_lines_are_flat_and_tagged() {
        let mut journal = EventJournal::new();
        journal.record(DomainEvent::ReservationAdded {
            customer: CustomerId::new(2),
            reservation: ReservationId::new(7),
            outcome: Outcome::DuplicateKey,
        });

        let out = journal.to_json_lines().unwrap();
        assert_eq!(out.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["event"], "reservation_added");
        assert_eq!(value["reservation"], 7);
        assert_eq!(value["outcome"], "duplicate_key");
        assert_eq!(value["sequence"], 1);
    }
}
