use async_trait::async_trait;
use uuid::Uuid;

use super::dispatch::MovementBatch;
use super::errors::DomainError;
use super::line_item::{CatalogProduct, ItemKind};
use super::order::{BookingSubmission, Order, OrderDraft, PaymentUpdate, PreBooking};
use super::report::{RawReport, ReportKind, ReportRange};

/// The external rental backend, which owns all persisted state.
#[async_trait]
pub trait RentalBackend: Send + Sync + 'static {
    async fn search_catalog(
        &self,
        kind: ItemKind,
        query: &str,
    ) -> Result<Vec<CatalogProduct>, DomainError>;
    async fn find_product(
        &self,
        kind: ItemKind,
        id: i64,
    ) -> Result<Option<CatalogProduct>, DomainError>;

    async fn create_booking(&self, booking: &BookingSubmission) -> Result<i64, DomainError>;
    async fn find_booking(&self, id: i64) -> Result<Option<PreBooking>, DomainError>;
    async fn update_booking(&self, id: i64, booking: &BookingSubmission)
        -> Result<(), DomainError>;
    /// Turns the pre-booking into an order, returning the order id.
    async fn convert_booking(
        &self,
        id: i64,
        booking: &BookingSubmission,
    ) -> Result<i64, DomainError>;

    async fn find_order(&self, id: i64) -> Result<Option<Order>, DomainError>;
    async fn submit_movement(&self, order_id: i64, batch: &MovementBatch)
        -> Result<(), DomainError>;
    async fn update_payment(&self, order_id: i64, payment: &PaymentUpdate)
        -> Result<(), DomainError>;

    async fn fetch_report(
        &self,
        kind: ReportKind,
        range: &ReportRange,
    ) -> Result<RawReport, DomainError>;
}

/// Short-lived storage for drafts that are being edited.
pub trait DraftRepository: Send + Sync + 'static {
    fn insert(&self, draft: OrderDraft) -> Result<Uuid, DomainError>;
    fn get(&self, id: Uuid) -> Result<Option<OrderDraft>, DomainError>;
    /// Applies `edit` under the store's write lock and returns the result.
    fn update<F>(&self, id: Uuid, edit: F) -> Result<OrderDraft, DomainError>
    where
        F: FnOnce(&mut OrderDraft) -> Result<(), DomainError>;
    fn remove(&self, id: Uuid) -> Result<Option<OrderDraft>, DomainError>;
    /// Puts a draft taken out with `remove` back under its id.
    fn restore(&self, id: Uuid, draft: OrderDraft) -> Result<(), DomainError>;
}
