use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::dispatch::{DispatchRecord, OrderedLine, Reconciliation, ReturnAccounting};
use super::errors::{DomainError, ValidationError};
use super::line_item::{CatalogProduct, ItemKind, ItemRef, LineItem};

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern is valid"));

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl RentalPeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, ValidationError> {
        if end_date < start_date {
            return Err(ValidationError::InvalidPeriod {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Inclusive day count: a same-day rental is one day.
    pub fn days(&self) -> i32 {
        let span = (self.end_date - self.start_date).num_days() + 1;
        i32::try_from(span).unwrap_or(i32::MAX)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub sub_total: BigDecimal,
    pub discount: BigDecimal,
    pub total_amount: BigDecimal,
    pub total_quantity: i64,
}

/// Full recomputation over both item sets.
pub fn compute_totals(
    items: &[LineItem],
    outsourced_items: &[LineItem],
    discount: &BigDecimal,
) -> OrderTotals {
    let lines = items.iter().chain(outsourced_items.iter());
    let (sub_total, total_quantity) = lines.fold(
        (BigDecimal::zero(), 0i64),
        |(sum, qty), line| (sum + line.line_total(), qty + i64::from(line.quantity)),
    );
    let total_amount = &sub_total - discount;
    OrderTotals {
        sub_total,
        discount: discount.clone(),
        total_amount,
        total_quantity,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPurpose {
    NewBooking,
    EditBooking(i64),
    ConvertBooking(i64),
}

/// Partial edit of a line; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub quantity: Option<i32>,
    pub unit_price: Option<BigDecimal>,
    pub days: Option<i32>,
}

/// A pre-booking or order being composed by an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub purpose: DraftPurpose,
    pub customer: Customer,
    pub period: Option<RentalPeriod>,
    pub no_of_days: i32,
    pub items: Vec<LineItem>,
    pub outsourced_items: Vec<LineItem>,
    pub discount: BigDecimal,
    pub notes: Option<String>,
}

impl OrderDraft {
    pub fn new(purpose: DraftPurpose) -> Self {
        Self {
            purpose,
            customer: Customer::default(),
            period: None,
            no_of_days: 1,
            items: Vec::new(),
            outsourced_items: Vec::new(),
            discount: BigDecimal::zero(),
            notes: None,
        }
    }

    pub fn from_booking(purpose: DraftPurpose, booking: PreBooking) -> Self {
        Self {
            purpose,
            customer: booking.customer,
            period: booking.period,
            no_of_days: booking.no_of_days,
            items: booking.items,
            outsourced_items: booking.outsourced_items,
            discount: booking.discount,
            notes: booking.notes,
        }
    }

    pub fn totals(&self) -> OrderTotals {
        compute_totals(&self.items, &self.outsourced_items, &self.discount)
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().chain(self.outsourced_items.iter())
    }

    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = Customer {
            name: customer.name.trim().to_string(),
            phone: customer.phone.trim().to_string(),
            email: customer.email.filter(|e| !e.trim().is_empty()),
            address: customer.address.filter(|a| !a.trim().is_empty()),
        };
    }

    /// Sets the rental period and resets every line to the new day count.
    pub fn set_period(&mut self, period: RentalPeriod, no_of_days: Option<i32>) {
        self.period = Some(period);
        self.no_of_days = no_of_days.unwrap_or_else(|| period.days());
        let days = self.no_of_days;
        for line in self.items.iter_mut().chain(self.outsourced_items.iter_mut()) {
            line.set_days(days);
        }
    }

    pub fn set_discount(&mut self, discount: BigDecimal) {
        self.discount = discount;
    }

    /// Blank notes clear the field.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
    }

    /// Adds one unit of `product`; an existing line for it is incremented
    /// rather than duplicated.
    pub fn add_product(&mut self, product: CatalogProduct) {
        let days = self.no_of_days;
        let lines = self.lines_for_mut(product.item.kind);
        match lines.iter().position(|l| l.item == product.item) {
            Some(pos) => {
                let line = &mut lines[pos];
                line.set_quantity(line.quantity.saturating_add(1));
            }
            None => lines.push(LineItem::from_product(product, days)),
        }
    }

    pub fn update_item(&mut self, item: ItemRef, update: ItemUpdate) -> Result<(), DomainError> {
        let line = self
            .lines_for_mut(item.kind)
            .iter_mut()
            .find(|l| l.item == item)
            .ok_or_else(|| DomainError::NotFound(format!("Line item {item}")))?;
        if let Some(quantity) = update.quantity {
            line.set_quantity(quantity);
        }
        if let Some(price) = update.unit_price {
            line.set_unit_price(price);
        }
        if let Some(days) = update.days {
            line.set_days(days);
        }
        Ok(())
    }

    pub fn remove_item(&mut self, item: ItemRef) -> Result<LineItem, DomainError> {
        let lines = self.lines_for_mut(item.kind);
        let pos = lines
            .iter()
            .position(|l| l.item == item)
            .ok_or_else(|| DomainError::NotFound(format!("Line item {item}")))?;
        Ok(lines.remove(pos))
    }

    fn lines_for_mut(&mut self, kind: ItemKind) -> &mut Vec<LineItem> {
        match kind {
            ItemKind::Inventory => &mut self.items,
            ItemKind::Outsourced => &mut self.outsourced_items,
        }
    }

    /// Every reason this draft cannot be submitted yet, in form order.
    pub fn validation_issues(&self) -> Vec<ValidationError> {
        let mut issues = Vec::new();

        if self.customer.name.trim().is_empty() {
            issues.push(ValidationError::MissingCustomerName);
        }
        let phone = self.customer.phone.trim();
        if phone.is_empty() {
            issues.push(ValidationError::MissingCustomerPhone);
        } else if !is_valid_phone(phone) {
            issues.push(ValidationError::InvalidPhone);
        }

        match self.period {
            None => issues.push(ValidationError::MissingPeriod),
            Some(p) if p.end_date < p.start_date => issues.push(ValidationError::InvalidPeriod {
                start: p.start_date,
                end: p.end_date,
            }),
            Some(_) => {}
        }

        if self.items.is_empty() && self.outsourced_items.is_empty() {
            issues.push(ValidationError::NoItems);
        }
        if self.no_of_days < 1 || self.lines().any(|l| l.days < 1) {
            issues.push(ValidationError::InvalidDays);
        }

        for line in self.lines() {
            if line.quantity < 1 {
                issues.push(ValidationError::InvalidQuantity {
                    name: line.name.clone(),
                });
            }
            if line.unit_price <= BigDecimal::zero() {
                issues.push(ValidationError::InvalidPrice {
                    name: line.name.clone(),
                });
            }
            if let (ItemKind::Inventory, Some(available)) = (line.item.kind, line.available_quantity)
            {
                if line.quantity > available {
                    issues.push(ValidationError::ExceedsStock {
                        name: line.name.clone(),
                        requested: line.quantity,
                        available,
                    });
                }
            }
        }

        if self.discount < BigDecimal::zero() {
            issues.push(ValidationError::NegativeDiscount);
        } else if self.totals().total_amount < BigDecimal::zero() {
            issues.push(ValidationError::DiscountExceedsSubTotal);
        }

        issues
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.validation_issues().into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }

    /// Validated payload for the backend.
    pub fn submission(
        &self,
        advance_payment: Option<BigDecimal>,
    ) -> Result<BookingSubmission, ValidationError> {
        self.validate()?;
        let period = self.period.ok_or(ValidationError::MissingPeriod)?;
        let totals = self.totals();
        if let Some(advance) = &advance_payment {
            if *advance < BigDecimal::zero() {
                return Err(ValidationError::NegativeAdvance);
            }
            if *advance > totals.total_amount {
                return Err(ValidationError::AdvanceExceedsTotal);
            }
        }
        Ok(BookingSubmission {
            customer: self.customer.clone(),
            period,
            no_of_days: self.no_of_days,
            items: self.items.clone(),
            outsourced_items: self.outsourced_items.clone(),
            totals,
            notes: self.notes.clone(),
            advance_payment,
        })
    }
}

/// A draft that passed validation, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingSubmission {
    pub customer: Customer,
    pub period: RentalPeriod,
    pub no_of_days: i32,
    pub items: Vec<LineItem>,
    pub outsourced_items: Vec<LineItem>,
    pub totals: OrderTotals,
    pub notes: Option<String>,
    pub advance_payment: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreBooking {
    pub id: i64,
    pub customer: Customer,
    pub period: Option<RentalPeriod>,
    pub no_of_days: i32,
    pub items: Vec<LineItem>,
    pub outsourced_items: Vec<LineItem>,
    pub discount: BigDecimal,
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub booking_id: Option<i64>,
    pub customer: Customer,
    pub period: Option<RentalPeriod>,
    pub no_of_days: i32,
    pub items: Vec<LineItem>,
    pub outsourced_items: Vec<LineItem>,
    pub discount: BigDecimal,
    pub paid_amount: BigDecimal,
    pub status: String,
    pub dispatches: Vec<DispatchRecord>,
}

impl Order {
    pub fn totals(&self) -> OrderTotals {
        compute_totals(&self.items, &self.outsourced_items, &self.discount)
    }

    pub fn payment(&self) -> PaymentSummary {
        PaymentSummary::new(self.totals().total_amount, self.paid_amount.clone())
    }

    pub fn ordered_lines(&self) -> Vec<OrderedLine> {
        self.items
            .iter()
            .chain(self.outsourced_items.iter())
            .map(|l| OrderedLine {
                item: l.item,
                name: l.name.clone(),
                quantity: l.quantity,
            })
            .collect()
    }

    pub fn reconciliation(&self, accounting: ReturnAccounting) -> Reconciliation {
        Reconciliation::build(&self.ordered_lines(), &self.dispatches, accounting)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSummary {
    pub total_amount: BigDecimal,
    pub paid_amount: BigDecimal,
    pub balance_due: BigDecimal,
    pub paid_percent: f64,
}

impl PaymentSummary {
    pub fn new(total_amount: BigDecimal, paid_amount: BigDecimal) -> Self {
        let balance_due = &total_amount - &paid_amount;
        let paid_percent = if total_amount > BigDecimal::zero() {
            let ratio = (&paid_amount / &total_amount).to_f64().unwrap_or(0.0) * 100.0;
            ratio.clamp(0.0, 100.0)
        } else {
            100.0
        };
        Self {
            total_amount,
            paid_amount,
            balance_due,
            paid_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUpdate {
    pub amount: BigDecimal,
    pub mode: String,
    pub note: Option<String>,
}

impl PaymentUpdate {
    pub fn validate(&self, summary: &PaymentSummary) -> Result<(), ValidationError> {
        if self.amount <= BigDecimal::zero() {
            return Err(ValidationError::InvalidPaymentAmount);
        }
        if self.amount > summary.balance_due {
            return Err(ValidationError::PaymentExceedsBalance);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn product(item: ItemRef, name: &str, price: &str, available: Option<i32>) -> CatalogProduct {
        CatalogProduct {
            item,
            name: name.to_string(),
            unit_price: dec(price),
            available_quantity: available,
        }
    }

    fn ready_draft() -> OrderDraft {
        let mut draft = OrderDraft::new(DraftPurpose::NewBooking);
        draft.set_customer(Customer {
            name: " Asha Rao ".to_string(),
            phone: "9876543210".to_string(),
            email: Some(String::new()),
            address: None,
        });
        draft.set_period(
            RentalPeriod::new(date("2024-03-01"), date("2024-03-03")).expect("valid period"),
            None,
        );
        draft.add_product(product(ItemRef::inventory(1), "Chair", "10", Some(50)));
        draft
    }

    #[test]
    fn period_day_count_is_inclusive() {
        let same_day = RentalPeriod::new(date("2024-03-01"), date("2024-03-01")).unwrap();
        assert_eq!(same_day.days(), 1);
        let three = RentalPeriod::new(date("2024-03-01"), date("2024-03-03")).unwrap();
        assert_eq!(three.days(), 3);
        assert!(matches!(
            RentalPeriod::new(date("2024-03-03"), date("2024-03-01")),
            Err(ValidationError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn sub_total_sums_every_line_across_both_sets() {
        let mut draft = ready_draft();
        draft.add_product(product(ItemRef::outsourced(9), "Generator", "250.75", None));
        draft
            .update_item(
                ItemRef::inventory(1),
                ItemUpdate {
                    quantity: Some(4),
                    ..Default::default()
                },
            )
            .unwrap();
        draft.set_discount(dec("20"));

        let totals = draft.totals();
        // 10 × 4 × 3 + 250.75 × 1 × 3
        assert_eq!(totals.sub_total, dec("872.25"));
        assert_eq!(totals.total_amount, dec("852.25"));
        assert_eq!(totals.total_quantity, 5);
    }

    #[test]
    fn adding_same_product_twice_increments_quantity() {
        let mut draft = ready_draft();
        draft.add_product(product(ItemRef::inventory(1), "Chair", "10", Some(50)));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].quantity, 2);

        // same id from the other catalog is a different line
        draft.add_product(product(ItemRef::outsourced(1), "Chair", "12", None));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.outsourced_items.len(), 1);
    }

    #[test]
    fn changing_period_resets_line_days() {
        let mut draft = ready_draft();
        assert_eq!(draft.items[0].days, 3);
        draft.set_period(
            RentalPeriod::new(date("2024-03-01"), date("2024-03-05")).unwrap(),
            None,
        );
        assert_eq!(draft.no_of_days, 5);
        assert_eq!(draft.items[0].days, 5);

        draft.set_period(
            RentalPeriod::new(date("2024-03-01"), date("2024-03-05")).unwrap(),
            Some(2),
        );
        assert_eq!(draft.items[0].days, 2);
    }

    #[test]
    fn customer_fields_are_normalised() {
        let draft = ready_draft();
        assert_eq!(draft.customer.name, "Asha Rao");
        assert_eq!(draft.customer.email, None);
    }

    #[test]
    fn ready_draft_passes_validation() {
        assert!(ready_draft().validation_issues().is_empty());
    }

    #[test]
    fn phone_must_be_exactly_ten_digits() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("98765"));
        assert!(!is_valid_phone("98765432101"));
        assert!(!is_valid_phone("98765-4321"));
        assert!(!is_valid_phone("٩٨٧٦٥٤٣٢١٠"));

        let mut draft = ready_draft();
        draft.customer.phone = "98765".to_string();
        assert_eq!(draft.validate(), Err(ValidationError::InvalidPhone));
    }

    #[test]
    fn empty_draft_reports_every_issue() {
        let draft = OrderDraft::new(DraftPurpose::NewBooking);
        assert_eq!(
            draft.validation_issues(),
            vec![
                ValidationError::MissingCustomerName,
                ValidationError::MissingCustomerPhone,
                ValidationError::MissingPeriod,
                ValidationError::NoItems,
            ]
        );
    }

    #[test]
    fn line_rules_are_checked() {
        let mut draft = ready_draft();
        draft.add_product(product(ItemRef::outsourced(3), "Tent", "0", None));
        draft
            .update_item(
                ItemRef::inventory(1),
                ItemUpdate {
                    quantity: Some(51),
                    ..Default::default()
                },
            )
            .unwrap();

        let issues = draft.validation_issues();
        assert!(issues.contains(&ValidationError::ExceedsStock {
            name: "Chair".to_string(),
            requested: 51,
            available: 50,
        }));
        assert!(issues.contains(&ValidationError::InvalidPrice {
            name: "Tent".to_string()
        }));

        draft
            .update_item(
                ItemRef::inventory(1),
                ItemUpdate {
                    quantity: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(draft.validation_issues().contains(&ValidationError::InvalidQuantity {
            name: "Chair".to_string()
        }));
    }

    #[test]
    fn zero_days_blocks_submission() {
        let mut draft = ready_draft();
        draft.set_period(
            RentalPeriod::new(date("2024-03-01"), date("2024-03-01")).unwrap(),
            Some(0),
        );
        assert_eq!(draft.validate(), Err(ValidationError::InvalidDays));
    }

    #[test]
    fn notes_are_trimmed_and_blank_clears() {
        let mut draft = OrderDraft::new(DraftPurpose::NewBooking);
        draft.set_notes(Some("  deliver by 9am ".to_string()));
        assert_eq!(draft.notes.as_deref(), Some("deliver by 9am"));
        draft.set_notes(Some("   ".to_string()));
        assert_eq!(draft.notes, None);
    }

    #[test]
    fn discount_larger_than_sub_total_blocks_submission() {
        let mut draft = ready_draft();
        draft.set_discount(dec("30"));
        assert!(draft.validate().is_ok());
        draft.set_discount(dec("30.01"));
        assert_eq!(draft.validate(), Err(ValidationError::DiscountExceedsSubTotal));
        draft.set_discount(dec("-1"));
        assert_eq!(draft.validate(), Err(ValidationError::NegativeDiscount));
    }

    #[test]
    fn removing_unknown_item_is_not_found() {
        let mut draft = ready_draft();
        assert!(matches!(
            draft.remove_item(ItemRef::outsourced(1)),
            Err(DomainError::NotFound(_))
        ));
        let removed = draft.remove_item(ItemRef::inventory(1)).unwrap();
        assert_eq!(removed.name, "Chair");
        assert_eq!(draft.validate(), Err(ValidationError::NoItems));
    }

    #[test]
    fn advance_payment_is_bounded_by_total() {
        let draft = ready_draft();
        assert!(draft.submission(Some(dec("30"))).is_ok());
        assert_eq!(
            draft.submission(Some(dec("30.5"))),
            Err(ValidationError::AdvanceExceedsTotal)
        );
        assert_eq!(
            draft.submission(Some(dec("-1"))),
            Err(ValidationError::NegativeAdvance)
        );
    }

    #[test]
    fn payment_summary_tracks_balance() {
        let summary = PaymentSummary::new(dec("200"), dec("50"));
        assert_eq!(summary.balance_due, dec("150"));
        assert!((summary.paid_percent - 25.0).abs() < f64::EPSILON);

        let update = PaymentUpdate {
            amount: dec("150"),
            mode: "cash".to_string(),
            note: None,
        };
        assert!(update.validate(&summary).is_ok());
        let too_much = PaymentUpdate {
            amount: dec("150.01"),
            ..update.clone()
        };
        assert_eq!(
            too_much.validate(&summary),
            Err(ValidationError::PaymentExceedsBalance)
        );
        let nothing = PaymentUpdate {
            amount: dec("0"),
            ..update
        };
        assert_eq!(
            nothing.validate(&summary),
            Err(ValidationError::InvalidPaymentAmount)
        );
    }
}
