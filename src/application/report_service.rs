use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::ports::RentalBackend;
use crate::domain::report::{ReportKind, ReportRange, ReportView};

pub struct ReportService<B> {
    backend: Arc<B>,
}

impl<B: RentalBackend> ReportService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Fetches the backend's report for `range` and shapes it for display.
    /// An inverted range is rejected before any request is made.
    pub async fn report(
        &self,
        kind: ReportKind,
        range: ReportRange,
        search: &str,
    ) -> Result<ReportView, DomainError> {
        range.validate()?;
        let raw = self.backend.fetch_report(kind, &range).await?;
        let view = kind.shape(raw, search)?;
        log::debug!(
            "{} report: {} of {} rows match '{}'",
            kind.as_str(),
            view.rows.len(),
            view.total_rows,
            search
        );
        Ok(view)
    }
}
