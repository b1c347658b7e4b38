use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};

use super::errors::DomainError;
use super::line_item::ItemRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Dispatched,
    Returned,
}

/// One entry in an order's dispatch history. Returns are recorded as their
/// own entries, never by editing a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub id: Option<i64>,
    pub item: ItemRef,
    pub quantity: i32,
    pub dispatch_date: Option<NaiveDate>,
    pub dispatch_time: Option<NaiveTime>,
    pub status: DispatchStatus,
}

/// How returned quantity affects what may still be dispatched or returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnAccounting {
    /// Returns are tracked but never offset the dispatched sum.
    #[default]
    Gross,
    /// Returns are subtracted from the quantity out with the customer.
    Net,
}

impl std::str::FromStr for ReturnAccounting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gross" => Ok(ReturnAccounting::Gross),
            "net" => Ok(ReturnAccounting::Net),
            other => Err(format!("unknown return accounting '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedLine {
    pub item: ItemRef,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemBalance {
    pub item: ItemRef,
    pub name: String,
    pub ordered: i32,
    pub dispatched: i32,
    pub returned: i32,
    /// Still to be dispatched; never negative.
    pub remaining: i32,
    /// Upper bound for a return request; never negative.
    pub returnable: i32,
}

impl ItemBalance {
    pub fn can_dispatch(&self) -> bool {
        self.remaining > 0
    }

    pub fn can_return(&self) -> bool {
        self.returnable > 0
    }

    pub fn clamp_dispatch(&self, requested: i32) -> i32 {
        requested.max(0).min(self.remaining)
    }

    pub fn clamp_return(&self, requested: i32) -> i32 {
        requested.max(0).min(self.returnable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    Dispatch,
    Return,
}

impl MovementKind {
    fn verb(&self) -> &'static str {
        match self {
            MovementKind::Dispatch => "dispatch",
            MovementKind::Return => "return",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityRequest {
    pub item: ItemRef,
    pub quantity: i32,
}

/// One batched dispatch or return; every line has a positive quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementBatch {
    pub kind: MovementKind,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub lines: Vec<QuantityRequest>,
}

impl MovementBatch {
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    NotStarted,
    Partial,
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub accounting: ReturnAccounting,
    pub balances: Vec<ItemBalance>,
}

impl Reconciliation {
    pub fn build(
        lines: &[OrderedLine],
        history: &[DispatchRecord],
        accounting: ReturnAccounting,
    ) -> Self {
        let mut dispatched: HashMap<ItemRef, i32> = HashMap::new();
        let mut returned: HashMap<ItemRef, i32> = HashMap::new();
        for record in history {
            let sums = match record.status {
                DispatchStatus::Dispatched => &mut dispatched,
                DispatchStatus::Returned => &mut returned,
            };
            let entry = sums.entry(record.item).or_insert(0);
            *entry = entry.saturating_add(record.quantity);
        }

        let balances = lines
            .iter()
            .map(|line| {
                let out = dispatched.get(&line.item).copied().unwrap_or(0);
                let back = returned.get(&line.item).copied().unwrap_or(0);
                let (remaining, returnable) = match accounting {
                    ReturnAccounting::Gross => (line.quantity - out, out),
                    ReturnAccounting::Net => {
                        let outstanding = (out - back).max(0);
                        (line.quantity - outstanding, outstanding)
                    }
                };
                ItemBalance {
                    item: line.item,
                    name: line.name.clone(),
                    ordered: line.quantity,
                    dispatched: out,
                    returned: back,
                    remaining: remaining.max(0),
                    returnable: returnable.max(0),
                }
            })
            .collect();

        Self {
            accounting,
            balances,
        }
    }

    pub fn balance(&self, item: ItemRef) -> Option<&ItemBalance> {
        self.balances.iter().find(|b| b.item == item)
    }

    /// Clamps each request to what the item allows and drops zero lines.
    /// Repeated requests for one item are summed first.
    pub fn plan(
        &self,
        kind: MovementKind,
        date: NaiveDate,
        time: Option<NaiveTime>,
        requests: &[QuantityRequest],
    ) -> Result<MovementBatch, DomainError> {
        let mut merged: Vec<QuantityRequest> = Vec::new();
        for request in requests {
            if self.balance(request.item).is_none() {
                return Err(DomainError::InvalidInput(format!(
                    "item {} is not part of this order",
                    request.item
                )));
            }
            match merged.iter().position(|m| m.item == request.item) {
                Some(pos) => {
                    let existing = &mut merged[pos];
                    existing.quantity = existing.quantity.saturating_add(request.quantity.max(0));
                }
                None => merged.push(QuantityRequest {
                    item: request.item,
                    quantity: request.quantity.max(0),
                }),
            }
        }

        let lines = merged
            .into_iter()
            .filter_map(|request| {
                let balance = self.balance(request.item)?;
                let quantity = match kind {
                    MovementKind::Dispatch => balance.clamp_dispatch(request.quantity),
                    MovementKind::Return => balance.clamp_return(request.quantity),
                };
                (quantity > 0).then_some(QuantityRequest {
                    item: request.item,
                    quantity,
                })
            })
            .collect::<Vec<_>>();

        if lines.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "nothing to {}",
                kind.verb()
            )));
        }
        Ok(MovementBatch {
            kind,
            date,
            time,
            lines,
        })
    }

    /// Every item at its maximum: "Dispatch All" / "Return All".
    pub fn plan_all(
        &self,
        kind: MovementKind,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<MovementBatch, DomainError> {
        let requests: Vec<QuantityRequest> = self
            .balances
            .iter()
            .map(|b| QuantityRequest {
                item: b.item,
                quantity: match kind {
                    MovementKind::Dispatch => b.remaining,
                    MovementKind::Return => b.returnable,
                },
            })
            .collect();
        self.plan(kind, date, time, &requests)
    }

    /// Share of ordered quantity that has gone out, 0–100.
    pub fn dispatched_percent(&self) -> f64 {
        let ordered: i64 = self.balances.iter().map(|b| i64::from(b.ordered.max(0))).sum();
        let out: i64 = self
            .balances
            .iter()
            .map(|b| i64::from(b.dispatched.min(b.ordered).max(0)))
            .sum();
        percent(out, ordered)
    }

    /// Share of dispatched quantity that has come back, 0–100.
    pub fn returned_percent(&self) -> f64 {
        let out: i64 = self.balances.iter().map(|b| i64::from(b.dispatched.max(0))).sum();
        let back: i64 = self
            .balances
            .iter()
            .map(|b| i64::from(b.returned.min(b.dispatched).max(0)))
            .sum();
        percent(back, out)
    }

    pub fn dispatch_progress(&self) -> Progress {
        progress(self.dispatched_percent())
    }

    pub fn return_progress(&self) -> Progress {
        progress(self.returned_percent())
    }
}

fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

fn progress(pct: f64) -> Progress {
    if pct <= 0.0 {
        Progress::NotStarted
    } else if pct >= 100.0 {
        Progress::Complete
    } else {
        Progress::Partial
    }
}
