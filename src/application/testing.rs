//! In-process `RentalBackend` for service tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde_json::{json, Map};

use crate::domain::dispatch::{DispatchRecord, DispatchStatus, MovementBatch, MovementKind};
use crate::domain::errors::{DomainError, UpstreamError};
use crate::domain::line_item::{CatalogProduct, ItemKind, ItemRef, LineItem};
use crate::domain::order::{
    BookingSubmission, Customer, Order, PaymentUpdate, PreBooking, RentalPeriod,
};
use crate::domain::ports::RentalBackend;
use crate::domain::report::{RawReport, ReportKind, ReportRange};

#[derive(Default)]
struct State {
    products: Vec<CatalogProduct>,
    bookings: HashMap<i64, PreBooking>,
    orders: HashMap<i64, Order>,
    created: Vec<BookingSubmission>,
    converted: Vec<(i64, BookingSubmission)>,
    movements: Vec<(i64, MovementBatch)>,
    payments: Vec<(i64, PaymentUpdate)>,
    reports: HashMap<&'static str, RawReport>,
    reports_fetched: Vec<(ReportKind, ReportRange)>,
    movement_failure: Option<String>,
    submission_failure: Option<String>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal")
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date")
}

fn line(item: ItemRef, name: &str, price: &str, quantity: i32, days: i32) -> LineItem {
    LineItem {
        item,
        name: name.to_string(),
        unit_price: dec(price),
        quantity,
        days,
        available_quantity: None,
    }
}

fn customer() -> Customer {
    Customer {
        name: "Asha Rao".to_string(),
        phone: "9876543210".to_string(),
        email: None,
        address: None,
    }
}

impl FakeBackend {
    /// Chair (inventory 1) and generator (outsourced 2) in the catalogs,
    /// pending booking 7, converted booking 8 and order 1 with four of its
    /// ten chairs already out.
    pub fn seeded() -> Self {
        let period = RentalPeriod::new(march(1), march(2)).ok();
        let booking = |id: i64, status: &str| PreBooking {
            id,
            customer: customer(),
            period,
            no_of_days: 2,
            items: vec![line(ItemRef::inventory(1), "Chair", "10.50", 2, 2)],
            outsourced_items: Vec::new(),
            discount: dec("0"),
            status: status.to_string(),
            notes: None,
        };
        let order = Order {
            id: 1,
            booking_id: Some(7),
            customer: customer(),
            period,
            no_of_days: 2,
            items: vec![line(ItemRef::inventory(1), "Chair", "10", 10, 2)],
            outsourced_items: Vec::new(),
            discount: dec("0"),
            paid_amount: dec("20"),
            status: "confirmed".to_string(),
            dispatches: vec![DispatchRecord {
                id: Some(1),
                item: ItemRef::inventory(1),
                quantity: 4,
                dispatch_date: Some(march(1)),
                dispatch_time: None,
                status: DispatchStatus::Dispatched,
            }],
        };

        let mut state = State {
            products: vec![
                CatalogProduct {
                    item: ItemRef::inventory(1),
                    name: "Chair".to_string(),
                    unit_price: dec("10.50"),
                    available_quantity: Some(20),
                },
                CatalogProduct {
                    item: ItemRef::outsourced(2),
                    name: "Generator".to_string(),
                    unit_price: dec("100"),
                    available_quantity: None,
                },
            ],
            ..State::default()
        };
        state.bookings.insert(7, booking(7, "pending"));
        state.bookings.insert(8, booking(8, "converted"));
        state.orders.insert(1, order);
        state.reports.insert("orders", orders_report());

        Self {
            state: Mutex::new(state),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().expect("fake backend lock");
        f(&mut state)
    }

    pub fn push_history(&self, order_id: i64, item: ItemRef, quantity: i32, status: DispatchStatus) {
        self.with_state(|s| {
            if let Some(order) = s.orders.get_mut(&order_id) {
                order.dispatches.push(DispatchRecord {
                    id: None,
                    item,
                    quantity,
                    dispatch_date: Some(march(2)),
                    dispatch_time: None,
                    status,
                });
            }
        });
    }

    /// Makes every following movement fail with `message`.
    pub fn fail_movements(&self, message: &str) {
        self.with_state(|s| s.movement_failure = Some(message.to_string()));
    }

    /// Makes every following booking creation fail with `message`.
    pub fn fail_submissions(&self, message: &str) {
        self.with_state(|s| s.submission_failure = Some(message.to_string()));
    }

    pub fn created_bookings(&self) -> Vec<BookingSubmission> {
        self.with_state(|s| s.created.clone())
    }

    pub fn converted_bookings(&self) -> Vec<(i64, BookingSubmission)> {
        self.with_state(|s| s.converted.clone())
    }

    pub fn movements(&self) -> Vec<(i64, MovementBatch)> {
        self.with_state(|s| s.movements.clone())
    }

    pub fn payments(&self) -> Vec<(i64, PaymentUpdate)> {
        self.with_state(|s| s.payments.clone())
    }

    pub fn reports_fetched(&self) -> Vec<(ReportKind, ReportRange)> {
        self.with_state(|s| s.reports_fetched.clone())
    }
}

fn orders_report() -> RawReport {
    let mut summary = Map::new();
    summary.insert("total_orders".to_string(), json!(2));
    summary.insert("total_revenue".to_string(), json!("1500.50"));
    RawReport {
        summary,
        rows: vec![
            json!({"order_number": "ORD-1", "customer_name": "Asha Rao", "total_amount": "1000"}),
            json!({"order_number": "ORD-2", "customer_name": "Vikram", "total_amount": 500.5}),
        ],
    }
}

#[async_trait]
impl RentalBackend for FakeBackend {
    async fn search_catalog(
        &self,
        kind: ItemKind,
        query: &str,
    ) -> Result<Vec<CatalogProduct>, DomainError> {
        let query = query.to_lowercase();
        Ok(self.with_state(|s| {
            s.products
                .iter()
                .filter(|p| p.item.kind == kind && p.name.to_lowercase().contains(&query))
                .cloned()
                .collect()
        }))
    }

    async fn find_product(
        &self,
        kind: ItemKind,
        id: i64,
    ) -> Result<Option<CatalogProduct>, DomainError> {
        let item = ItemRef { kind, id };
        Ok(self.with_state(|s| s.products.iter().find(|p| p.item == item).cloned()))
    }

    async fn create_booking(&self, booking: &BookingSubmission) -> Result<i64, DomainError> {
        // let other tasks run while the "request" is in flight
        tokio::task::yield_now().await;
        self.with_state(|s| {
            if let Some(message) = &s.submission_failure {
                return Err(UpstreamError::Rejected {
                    status: Some(422),
                    message: Some(message.clone()),
                }
                .into());
            }
            s.created.push(booking.clone());
            Ok(99 + s.created.len() as i64)
        })
    }

    async fn find_booking(&self, id: i64) -> Result<Option<PreBooking>, DomainError> {
        Ok(self.with_state(|s| s.bookings.get(&id).cloned()))
    }

    async fn update_booking(
        &self,
        id: i64,
        booking: &BookingSubmission,
    ) -> Result<(), DomainError> {
        self.with_state(|s| match s.bookings.get_mut(&id) {
            Some(existing) => {
                existing.customer = booking.customer.clone();
                existing.items = booking.items.clone();
                existing.outsourced_items = booking.outsourced_items.clone();
                existing.discount = booking.totals.discount.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound(format!("Pre-booking {id}"))),
        })
    }

    async fn convert_booking(
        &self,
        id: i64,
        booking: &BookingSubmission,
    ) -> Result<i64, DomainError> {
        Ok(self.with_state(|s| {
            s.converted.push((id, booking.clone()));
            if let Some(existing) = s.bookings.get_mut(&id) {
                existing.status = "converted".to_string();
            }
            499 + s.converted.len() as i64
        }))
    }

    async fn find_order(&self, id: i64) -> Result<Option<Order>, DomainError> {
        Ok(self.with_state(|s| s.orders.get(&id).cloned()))
    }

    async fn submit_movement(
        &self,
        order_id: i64,
        batch: &MovementBatch,
    ) -> Result<(), DomainError> {
        self.with_state(|s| {
            if let Some(message) = &s.movement_failure {
                return Err(UpstreamError::Rejected {
                    status: Some(422),
                    message: Some(message.clone()),
                }
                .into());
            }
            let order = s
                .orders
                .get_mut(&order_id)
                .ok_or_else(|| DomainError::NotFound(format!("Order {order_id}")))?;
            let status = match batch.kind {
                MovementKind::Dispatch => DispatchStatus::Dispatched,
                MovementKind::Return => DispatchStatus::Returned,
            };
            for line in &batch.lines {
                order.dispatches.push(DispatchRecord {
                    id: None,
                    item: line.item,
                    quantity: line.quantity,
                    dispatch_date: Some(batch.date),
                    dispatch_time: batch.time,
                    status,
                });
            }
            s.movements.push((order_id, batch.clone()));
            Ok(())
        })
    }

    async fn update_payment(
        &self,
        order_id: i64,
        payment: &PaymentUpdate,
    ) -> Result<(), DomainError> {
        self.with_state(|s| {
            let order = s
                .orders
                .get_mut(&order_id)
                .ok_or_else(|| DomainError::NotFound(format!("Order {order_id}")))?;
            order.paid_amount = &order.paid_amount + &payment.amount;
            s.payments.push((order_id, payment.clone()));
            Ok(())
        })
    }

    async fn fetch_report(
        &self,
        kind: ReportKind,
        range: &ReportRange,
    ) -> Result<RawReport, DomainError> {
        Ok(self.with_state(|s| {
            s.reports_fetched.push((kind, *range));
            s.reports.get(kind.as_str()).cloned().unwrap_or_default()
        }))
    }
}
