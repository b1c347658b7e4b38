use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::domain::dispatch::{MovementBatch, MovementKind};
use crate::domain::errors::{DomainError, UpstreamError};
use crate::domain::line_item::{CatalogProduct, ItemKind};
use crate::domain::order::{BookingSubmission, Order, PaymentUpdate, PreBooking};
use crate::domain::ports::RentalBackend;
use crate::domain::report::{RawReport, ReportKind, ReportRange};

use super::endpoints;
use super::models::{
    created_id, raw_report, BookingRow, EnvelopeRow, MovementRow, NewBookingRow, OrderRow,
    PaymentRow, ProductRow,
};

/// `RentalBackend` over the backend's JSON REST API.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &BackendConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and unwraps the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, UpstreamError> {
        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<EnvelopeRow<IgnoredAny>>(&body)
                .ok()
                .and_then(|e| e.message);
            log::warn!("backend answered {status}: {}", message.as_deref().unwrap_or("-"));
            return Err(UpstreamError::Rejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope: EnvelopeRow<T> =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        if !envelope.success {
            log::warn!(
                "backend refused request: {}",
                envelope.message.as_deref().unwrap_or("-")
            );
            return Err(UpstreamError::Rejected {
                status: None,
                message: envelope.message,
            });
        }
        Ok(envelope.data)
    }

    /// Like `call`, but a 404 means the record does not exist.
    async fn find<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, UpstreamError> {
        match self.call(self.request(Method::GET, path)).await {
            Ok(data) => Ok(data),
            Err(UpstreamError::Rejected {
                status: Some(404), ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Option<Value>, UpstreamError> {
        self.call(self.request(method, path).json(body)).await
    }
}

fn missing_id(what: &str) -> UpstreamError {
    UpstreamError::Decode(format!("{what} response carried no id"))
}

#[async_trait]
impl RentalBackend for HttpBackend {
    async fn search_catalog(
        &self,
        kind: ItemKind,
        query: &str,
    ) -> Result<Vec<CatalogProduct>, DomainError> {
        let builder = self
            .request(Method::GET, endpoints::catalog(kind))
            .query(&[("search", query)]);
        let rows = self.call::<Vec<ProductRow>>(builder).await?;
        Ok(rows
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| r.into_product(kind))
            .collect())
    }

    async fn find_product(
        &self,
        kind: ItemKind,
        id: i64,
    ) -> Result<Option<CatalogProduct>, DomainError> {
        let row: Option<ProductRow> = self.find(&endpoints::catalog_item(kind, id)).await?;
        Ok(row.and_then(|mut r| {
            r.id.get_or_insert(id);
            r.into_product(kind)
        }))
    }

    async fn create_booking(&self, booking: &BookingSubmission) -> Result<i64, DomainError> {
        let data = self
            .send_json(Method::POST, endpoints::BOOKINGS, &NewBookingRow::from(booking))
            .await?;
        created_id(data.as_ref(), &["id", "booking_id"])
            .ok_or_else(|| missing_id("booking").into())
    }

    async fn find_booking(&self, id: i64) -> Result<Option<PreBooking>, DomainError> {
        let row: Option<BookingRow> = self.find(&endpoints::booking(id)).await?;
        Ok(row.map(|r| r.into_booking(id)))
    }

    async fn update_booking(
        &self,
        id: i64,
        booking: &BookingSubmission,
    ) -> Result<(), DomainError> {
        self.send_json(Method::PUT, &endpoints::booking(id), &NewBookingRow::from(booking))
            .await?;
        Ok(())
    }

    async fn convert_booking(
        &self,
        id: i64,
        booking: &BookingSubmission,
    ) -> Result<i64, DomainError> {
        let data = self
            .send_json(
                Method::POST,
                &endpoints::booking_convert(id),
                &NewBookingRow::from(booking),
            )
            .await?;
        created_id(data.as_ref(), &["order_id", "id"])
            .ok_or_else(|| missing_id("conversion").into())
    }

    async fn find_order(&self, id: i64) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = self.find(&endpoints::order(id)).await?;
        Ok(row.map(|r| r.into_order(id)))
    }

    async fn submit_movement(
        &self,
        order_id: i64,
        batch: &MovementBatch,
    ) -> Result<(), DomainError> {
        let path = match batch.kind {
            MovementKind::Dispatch => endpoints::order_dispatch(order_id),
            MovementKind::Return => endpoints::order_return(order_id),
        };
        self.send_json(Method::POST, &path, &MovementRow::from(batch))
            .await?;
        Ok(())
    }

    async fn update_payment(
        &self,
        order_id: i64,
        payment: &PaymentUpdate,
    ) -> Result<(), DomainError> {
        self.send_json(
            Method::PUT,
            &endpoints::payment_update(order_id),
            &PaymentRow::from(payment),
        )
        .await?;
        Ok(())
    }

    async fn fetch_report(
        &self,
        kind: ReportKind,
        range: &ReportRange,
    ) -> Result<RawReport, DomainError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(from) = range.from {
            params.push(("from", from.to_string()));
        }
        if let Some(to) = range.to {
            params.push(("to", to.to_string()));
        }
        let builder = self
            .request(Method::GET, &endpoints::report(kind))
            .query(&params);
        let data = self.call::<Value>(builder).await?;
        Ok(data.map(raw_report).unwrap_or_default())
    }
}
