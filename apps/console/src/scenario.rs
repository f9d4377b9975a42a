//! # Service Walkthrough
//!
//! One scripted evening of service, driven through the public registry API.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. open      restaurant, tables, lunch menu                            │
//! │  2. guests    customer 1 (non-member), customer 2 (member, 50 credits)  │
//! │               member's car goes to the valet, the guest walked in       │
//! │  3. order     both order Pasta + Soda and pay                           │
//! │  4. mistakes  second payment, reservation 7 twice, supervisor cycle     │
//! │  5. edits     line-item changes on a third order                        │
//! │  6. close     refund, role switch, order handed over, car brought back  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejected commands are expected here; they land in the transcript instead
//! of aborting the run.

use bistro_core::{
    CoreError, CoreResult, Customer, CustomerId, Dish, DishId, Employee, EmployeeId, EntityKind,
    Menu, Money, PaymentMethod, Registry, Reservation, ReservationId, Restaurant, Role, Table,
    TableId, Valet, ValetId,
};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::BistroConfig;
use crate::error::AppResult;
use crate::narrate::Transcript;

const MENU: &str = "Lunch";
const PASTA: DishId = DishId::new(1);
const SODA: DishId = DishId::new(2);
const TIRAMISU: DishId = DishId::new(3);

const GUEST: CustomerId = CustomerId::new(1);
const MEMBER: CustomerId = CustomerId::new(2);
const VALET: ValetId = ValetId::new(1);

/// Runs the walkthrough against `registry` and returns what happened.
pub fn run(registry: &mut Registry, config: &BistroConfig) -> AppResult<Transcript> {
    let mut transcript = Transcript::new();
    let restaurant = config.restaurant.name.as_str();

    // 1. open
    info!(restaurant, "Opening");
    registry.register_restaurant(Restaurant::new(restaurant, config.restaurant.max_capacity))?;
    let tables = config.restaurant.max_capacity.min(4);
    for id in 1..=tables {
        registry.add_table(restaurant, Table::new(TableId::new(id), 4))?;
    }
    registry.register_menu(
        Menu::new(MENU)
            .with_dish(Dish::new(PASTA, "Pasta", Money::from_cents(1200)))
            .with_dish(Dish::new(SODA, "Soda", Money::from_cents(200)))
            .with_dish(Dish::new(TIRAMISU, "Tiramisu", Money::from_cents(650))),
    )?;
    registry.add_menu(restaurant, MENU)?;
    transcript.record_events(registry.drain_events());

    // 2. guests
    registry.register_customer(Customer::new(GUEST, Role::NonMember))?;
    registry.register_customer(
        Customer::new(MEMBER, Role::Member { credit_points: 50 }).with_car("WX 1234"),
    )?;
    registry.register_valet(Valet::new(VALET, "Front entrance"))?;
    registry.park_car(VALET, MEMBER)?;
    transcript.record_events(registry.drain_events());
    let walked_in = registry.park_car(VALET, GUEST);
    expect_rejection(&mut transcript, "park a car for a guest who walked in", walked_in);

    // 3. order
    let pasta = dish(registry, PASTA)?;
    let soda = dish(registry, SODA)?;
    let tiramisu = dish(registry, TIRAMISU)?;

    info!("Taking orders");
    let guest_order = registry.place_order(GUEST, &[pasta.clone(), soda.clone()])?;
    let guest_payment = registry.make_payment(GUEST, guest_order, PaymentMethod::Cash)?;
    let member_order = registry.place_order(MEMBER, &[pasta, soda.clone()])?;
    registry.make_payment(MEMBER, member_order, PaymentMethod::Card)?;
    transcript.record_events(registry.drain_events());

    // 4. mistakes
    info!("Handling mistakes");
    let second = registry.make_payment(GUEST, guest_order, PaymentMethod::Card);
    expect_rejection(&mut transcript, "pay order twice", second);

    let reservation = ReservationId::new(7);
    registry.register_reservation(Reservation::new(reservation, 4))?;
    registry.add_reservation(GUEST, reservation)?;
    registry.add_reservation(GUEST, reservation)?;
    registry.add_reservation(MEMBER, reservation)?;
    transcript.record_events(registry.drain_events());

    let (head, sous, line) = staff(registry)?;
    registry.add_subordinate(head, sous)?;
    registry.add_subordinate(sous, line)?;
    transcript.record_events(registry.drain_events());
    let cycle = registry.set_supervisor(head, Some(line));
    expect_rejection(&mut transcript, "make the line cook supervise the head chef", cycle);

    // 5. edits
    info!("Editing an open order");
    let open_order = registry.place_order(GUEST, &[tiramisu, soda.clone(), soda])?;
    registry.set_item_quantity(open_order, TIRAMISU, 2)?;
    registry.reduce_item(open_order, SODA, 1)?;
    registry.remove_item(open_order, PASTA)?;
    transcript.record_events(registry.drain_events());
    let over = registry.reduce_item(open_order, SODA, 5);
    expect_rejection(&mut transcript, "take 5 sodas off a single soda", over);

    // 6. close
    info!("Closing");
    registry.refund_payment(guest_payment)?;
    registry.switch_role(GUEST, Role::member())?;
    registry.set_order_customer(open_order, Some(MEMBER))?;
    registry.remove_subordinate(sous, line)?;
    registry.retrieve_car(VALET, MEMBER)?;
    transcript.record_events(registry.drain_events());

    Ok(transcript)
}

fn dish(registry: &Registry, id: DishId) -> CoreResult<Dish> {
    registry
        .menu(MENU)
        .and_then(|menu| menu.dish(id))
        .cloned()
        .ok_or_else(|| CoreError::unknown(EntityKind::Dish, id))
}

fn staff(registry: &mut Registry) -> CoreResult<(EmployeeId, EmployeeId, EmployeeId)> {
    let hired = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    let head = registry.register_employee(Employee::new(
        EmployeeId::new(1),
        hired(2019, 4, 1),
        "Kitchen",
    ))?;
    let sous = registry.register_employee(Employee::new(
        EmployeeId::new(2),
        hired(2021, 9, 15),
        "Kitchen",
    ))?;
    let line = registry.register_employee(Employee::new(
        EmployeeId::new(3),
        hired(2024, 2, 1),
        "Kitchen",
    ))?;
    Ok((head, sous, line))
}

fn expect_rejection<T>(transcript: &mut Transcript, action: &str, result: CoreResult<T>) {
    match result {
        Err(err) => transcript.record_rejection(action, &err),
        Ok(_) => warn!(action, "Expected a rejection but the command succeeded"),
    }
}
