use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A reason a draft, payment or report request cannot be submitted.
///
/// The `Display` text is shown to the operator as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Customer name is required")]
    MissingCustomerName,
    #[error("Customer phone is required")]
    MissingCustomerPhone,
    #[error("Phone number must be exactly 10 digits")]
    InvalidPhone,
    #[error("Rental period is required")]
    MissingPeriod,
    #[error("Rental end date {end} is before start date {start}")]
    InvalidPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    #[error("Add at least one item")]
    NoItems,
    #[error("Number of days must be at least 1")]
    InvalidDays,
    #[error("Quantity for {name} must be at least 1")]
    InvalidQuantity { name: String },
    #[error("Price for {name} must be greater than 0")]
    InvalidPrice { name: String },
    #[error("Only {available} units of {name} are available")]
    ExceedsStock {
        name: String,
        requested: i32,
        available: i32,
    },
    #[error("Discount cannot be negative")]
    NegativeDiscount,
    #[error("Discount cannot exceed the sub total")]
    DiscountExceedsSubTotal,
    #[error("Advance payment cannot be negative")]
    NegativeAdvance,
    #[error("Advance payment cannot exceed the total amount")]
    AdvanceExceedsTotal,
    #[error("Payment amount must be greater than 0")]
    InvalidPaymentAmount,
    #[error("Payment amount exceeds the balance due")]
    PaymentExceedsBalance,
    #[error("Report start date must not be after its end date")]
    InvalidReportRange,
}

/// Failure talking to the rental backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// The backend answered but refused: non-2xx status or `success: false`.
    #[error("{}", rejection_text(.status, .message))]
    Rejected {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("{0}")]
    Transport(String),
    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

fn rejection_text(status: &Option<u16>, message: &Option<String>) -> String {
    match (message.as_deref().map(str::trim), status) {
        (Some(m), _) if !m.is_empty() => m.to_string(),
        (_, Some(code)) => format!("Request failed with status code {code}"),
        _ => String::new(),
    }
}

impl UpstreamError {
    /// Message the backend put in its response envelope, if any.
    pub fn response_message(&self) -> Option<&str> {
        match self {
            UpstreamError::Rejected {
                message: Some(m), ..
            } if !m.trim().is_empty() => Some(m.trim()),
            _ => None,
        }
    }

    /// Message to show the operator: the backend's own message, then the
    /// error's message, then `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(m) = self.response_message() {
            return m.to_string();
        }
        let own = self.to_string();
        if own.trim().is_empty() {
            fallback.to_string()
        } else {
            own
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Rejected { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_message_wins() {
        let err = UpstreamError::Rejected {
            status: Some(422),
            message: Some("Insufficient stock".to_string()),
        };
        assert_eq!(err.user_message("Failed to dispatch items"), "Insufficient stock");
    }

    #[test]
    fn status_text_used_when_backend_sent_no_message() {
        let err = UpstreamError::Rejected {
            status: Some(500),
            message: None,
        };
        assert_eq!(
            err.user_message("Failed to dispatch items"),
            "Request failed with status code 500"
        );
    }

    #[test]
    fn transport_message_used_before_fallback() {
        let err = UpstreamError::Transport("connection refused".to_string());
        assert_eq!(err.user_message("Failed to load order"), "connection refused");
    }

    #[test]
    fn fallback_when_nothing_else_is_known() {
        let err = UpstreamError::Rejected {
            status: None,
            message: Some("   ".to_string()),
        };
        assert_eq!(err.user_message("Failed to load order"), "Failed to load order");
        assert_eq!(
            UpstreamError::Transport(String::new()).user_message("Failed to load order"),
            "Failed to load order"
        );
    }

    #[test]
    fn validation_display_is_operator_text() {
        let err = ValidationError::ExceedsStock {
            name: "Chair".to_string(),
            requested: 12,
            available: 10,
        };
        assert_eq!(err.to_string(), "Only 10 units of Chair are available");
    }
}
