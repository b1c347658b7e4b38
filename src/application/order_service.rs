use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::domain::dispatch::{MovementKind, QuantityRequest, Reconciliation, ReturnAccounting};
use crate::domain::errors::{DomainError, ValidationError};
use crate::domain::line_item::{CatalogProduct, ItemKind, ItemRef};
use crate::domain::order::{
    Customer, DraftPurpose, ItemUpdate, Order, OrderDraft, OrderTotals, PaymentSummary,
    PaymentUpdate, RentalPeriod,
};
use crate::domain::ports::{DraftRepository, RentalBackend};

/// A draft as the operator sees it: its fields, live totals and whatever
/// still blocks submission.
#[derive(Debug, Clone)]
pub struct DraftView {
    pub id: Uuid,
    pub draft: OrderDraft,
    pub totals: OrderTotals,
    pub issues: Vec<ValidationError>,
}

impl DraftView {
    fn new(id: Uuid, draft: OrderDraft) -> Self {
        Self {
            id,
            totals: draft.totals(),
            issues: draft.validation_issues(),
            draft,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub totals: OrderTotals,
    pub payment: PaymentSummary,
    pub reconciliation: Reconciliation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    BookingCreated { booking_id: i64 },
    BookingUpdated { booking_id: i64 },
    OrderCreated { booking_id: i64, order_id: i64 },
}

pub struct OrderService<B, D> {
    backend: Arc<B>,
    drafts: D,
    accounting: ReturnAccounting,
}

impl<B: RentalBackend, D: DraftRepository> OrderService<B, D> {
    pub fn new(backend: Arc<B>, drafts: D, accounting: ReturnAccounting) -> Self {
        Self {
            backend,
            drafts,
            accounting,
        }
    }

    // ── Drafts ───────────────────────────────────────────────────────────────

    pub fn start_booking(&self) -> Result<DraftView, DomainError> {
        let draft = OrderDraft::new(DraftPurpose::NewBooking);
        let id = self.drafts.insert(draft.clone())?;
        Ok(DraftView::new(id, draft))
    }

    pub async fn start_booking_edit(&self, booking_id: i64) -> Result<DraftView, DomainError> {
        self.start_from_booking(DraftPurpose::EditBooking(booking_id), booking_id)
            .await
    }

    pub async fn start_conversion(&self, booking_id: i64) -> Result<DraftView, DomainError> {
        self.start_from_booking(DraftPurpose::ConvertBooking(booking_id), booking_id)
            .await
    }

    async fn start_from_booking(
        &self,
        purpose: DraftPurpose,
        booking_id: i64,
    ) -> Result<DraftView, DomainError> {
        let booking = self
            .backend
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Pre-booking {booking_id}")))?;
        if booking.status.eq_ignore_ascii_case("converted") {
            return Err(DomainError::InvalidInput(format!(
                "pre-booking {booking_id} was already converted"
            )));
        }
        let draft = OrderDraft::from_booking(purpose, booking);
        let id = self.drafts.insert(draft.clone())?;
        Ok(DraftView::new(id, draft))
    }

    pub fn get_draft(&self, id: Uuid) -> Result<DraftView, DomainError> {
        let draft = self
            .drafts
            .get(id)?
            .ok_or_else(|| DomainError::NotFound(format!("Draft {id}")))?;
        Ok(DraftView::new(id, draft))
    }

    pub fn discard_draft(&self, id: Uuid) -> Result<(), DomainError> {
        self.drafts
            .remove(id)?
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("Draft {id}")))
    }

    fn edit<F>(&self, id: Uuid, edit: F) -> Result<DraftView, DomainError>
    where
        F: FnOnce(&mut OrderDraft) -> Result<(), DomainError>,
    {
        let draft = self.drafts.update(id, edit)?;
        Ok(DraftView::new(id, draft))
    }

    pub fn update_customer(&self, id: Uuid, customer: Customer) -> Result<DraftView, DomainError> {
        self.edit(id, |d| {
            d.set_customer(customer);
            Ok(())
        })
    }

    pub fn update_period(
        &self,
        id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        no_of_days: Option<i32>,
    ) -> Result<DraftView, DomainError> {
        let period = RentalPeriod::new(start_date, end_date)?;
        self.edit(id, |d| {
            d.set_period(period, no_of_days);
            Ok(())
        })
    }

    pub fn update_discount(&self, id: Uuid, discount: BigDecimal) -> Result<DraftView, DomainError> {
        self.edit(id, |d| {
            d.set_discount(discount);
            Ok(())
        })
    }

    pub fn update_notes(&self, id: Uuid, notes: Option<String>) -> Result<DraftView, DomainError> {
        self.edit(id, |d| {
            d.set_notes(notes);
            Ok(())
        })
    }

    /// Looks the product up in its catalog and adds one unit of it.
    pub async fn add_item(&self, id: Uuid, item: ItemRef) -> Result<DraftView, DomainError> {
        // fail fast on a stale draft before calling out
        self.get_draft(id)?;
        let product = self
            .backend
            .find_product(item.kind, item.id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Product {item}")))?;
        self.edit(id, |d| {
            d.add_product(product);
            Ok(())
        })
    }

    pub fn update_item(
        &self,
        id: Uuid,
        item: ItemRef,
        update: ItemUpdate,
    ) -> Result<DraftView, DomainError> {
        self.edit(id, |d| d.update_item(item, update))
    }

    pub fn remove_item(&self, id: Uuid, item: ItemRef) -> Result<DraftView, DomainError> {
        self.edit(id, |d| d.remove_item(item).map(|_| ()))
    }

    /// Validates the draft and hands it to the backend according to its
    /// purpose. The draft leaves the store for the duration of the call, so a
    /// second submit of the same draft is refused as not found. It is put
    /// back if validation or the backend fails.
    pub async fn submit_draft(
        &self,
        id: Uuid,
        advance_payment: Option<BigDecimal>,
    ) -> Result<SubmitOutcome, DomainError> {
        let draft = self
            .drafts
            .remove(id)?
            .ok_or_else(|| DomainError::NotFound(format!("Draft {id}")))?;
        match self.send_draft(id, &draft, advance_payment).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.drafts.restore(id, draft)?;
                Err(e)
            }
        }
    }

    async fn send_draft(
        &self,
        id: Uuid,
        draft: &OrderDraft,
        advance_payment: Option<BigDecimal>,
    ) -> Result<SubmitOutcome, DomainError> {
        let purpose = draft.purpose;
        if advance_payment.is_some() && !matches!(purpose, DraftPurpose::ConvertBooking(_)) {
            return Err(DomainError::InvalidInput(
                "advance payment applies only to order conversion".to_string(),
            ));
        }
        let submission = draft.submission(advance_payment)?;

        let outcome = match purpose {
            DraftPurpose::NewBooking => {
                let booking_id = self.backend.create_booking(&submission).await?;
                SubmitOutcome::BookingCreated { booking_id }
            }
            DraftPurpose::EditBooking(booking_id) => {
                self.backend.update_booking(booking_id, &submission).await?;
                SubmitOutcome::BookingUpdated { booking_id }
            }
            DraftPurpose::ConvertBooking(booking_id) => {
                let order_id = self.backend.convert_booking(booking_id, &submission).await?;
                SubmitOutcome::OrderCreated {
                    booking_id,
                    order_id,
                }
            }
        };
        log::info!(
            "draft {id} submitted: {outcome:?}, total {} for {} units",
            submission.totals.total_amount,
            submission.totals.total_quantity
        );
        Ok(outcome)
    }

    pub async fn search_catalog(
        &self,
        kind: ItemKind,
        query: &str,
    ) -> Result<Vec<CatalogProduct>, DomainError> {
        self.backend.search_catalog(kind, query.trim()).await
    }

    // ── Orders ───────────────────────────────────────────────────────────────

    pub async fn order_details(&self, order_id: i64) -> Result<OrderDetails, DomainError> {
        let order = self
            .backend
            .find_order(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Order {order_id}")))?;
        Ok(OrderDetails {
            totals: order.totals(),
            payment: order.payment(),
            reconciliation: order.reconciliation(self.accounting),
            order,
        })
    }

    pub async fn dispatch(
        &self,
        order_id: i64,
        date: NaiveDate,
        time: Option<NaiveTime>,
        requests: &[QuantityRequest],
    ) -> Result<OrderDetails, DomainError> {
        self.move_stock(order_id, MovementKind::Dispatch, date, time, Some(requests))
            .await
    }

    pub async fn dispatch_all(
        &self,
        order_id: i64,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<OrderDetails, DomainError> {
        self.move_stock(order_id, MovementKind::Dispatch, date, time, None)
            .await
    }

    pub async fn return_items(
        &self,
        order_id: i64,
        date: NaiveDate,
        time: Option<NaiveTime>,
        requests: &[QuantityRequest],
    ) -> Result<OrderDetails, DomainError> {
        self.move_stock(order_id, MovementKind::Return, date, time, Some(requests))
            .await
    }

    pub async fn return_all(
        &self,
        order_id: i64,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<OrderDetails, DomainError> {
        self.move_stock(order_id, MovementKind::Return, date, time, None)
            .await
    }

    /// Plans against the current history, submits one batch, then reloads
    /// the order so the caller sees the backend's view.
    async fn move_stock(
        &self,
        order_id: i64,
        kind: MovementKind,
        date: NaiveDate,
        time: Option<NaiveTime>,
        requests: Option<&[QuantityRequest]>,
    ) -> Result<OrderDetails, DomainError> {
        let current = self.order_details(order_id).await?;
        let batch = match requests {
            Some(requests) => {
                let batch = current.reconciliation.plan(kind, date, time, requests)?;
                let requested: i64 = requests.iter().map(|r| i64::from(r.quantity.max(0))).sum();
                if requested != batch.total_quantity() {
                    log::debug!(
                        "order {order_id}: {kind:?} request of {requested} clamped to {}",
                        batch.total_quantity()
                    );
                }
                batch
            }
            None => current.reconciliation.plan_all(kind, date, time)?,
        };

        if let Err(e) = self.backend.submit_movement(order_id, &batch).await {
            log::warn!("order {order_id}: {kind:?} of {} units failed: {e}", batch.total_quantity());
            return Err(e);
        }
        log::info!(
            "order {order_id}: {kind:?} of {} units across {} items",
            batch.total_quantity(),
            batch.lines.len()
        );
        self.order_details(order_id).await
    }

    pub async fn record_payment(
        &self,
        order_id: i64,
        payment: PaymentUpdate,
    ) -> Result<OrderDetails, DomainError> {
        let current = self.order_details(order_id).await?;
        payment.validate(&current.payment)?;
        if let Err(e) = self.backend.update_payment(order_id, &payment).await {
            log::warn!("order {order_id}: payment of {} failed: {e}", payment.amount);
            return Err(e);
        }
        log::info!(
            "order {order_id}: payment of {} via {}",
            payment.amount,
            payment.mode
        );
        self.order_details(order_id).await
    }
}
