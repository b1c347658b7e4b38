use bigdecimal::BigDecimal;

/// Where a line item's stock comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Inventory,
    Outsourced,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Inventory => "inventory",
            ItemKind::Outsourced => "outsourced",
        }
    }
}

/// Identifies a line item within an order: an owned inventory product or a
/// product rented in from a supplier. Ids from the two catalogs may collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: i64,
}

impl ItemRef {
    pub fn inventory(id: i64) -> Self {
        Self {
            kind: ItemKind::Inventory,
            id,
        }
    }

    pub fn outsourced(id: i64) -> Self {
        Self {
            kind: ItemKind::Outsourced,
            id,
        }
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.id)
    }
}

/// A product as listed by the inventory or outsourced catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub item: ItemRef,
    pub name: String,
    pub unit_price: BigDecimal,
    /// Stock ceiling; only inventory products carry one.
    pub available_quantity: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub item: ItemRef,
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub days: i32,
    pub available_quantity: Option<i32>,
}

/// `unit_price × quantity × days`.
pub fn line_total(unit_price: &BigDecimal, quantity: i32, days: i32) -> BigDecimal {
    unit_price * BigDecimal::from(quantity) * BigDecimal::from(days)
}

impl LineItem {
    /// A fresh line for `product` with quantity 1.
    pub fn from_product(product: CatalogProduct, days: i32) -> Self {
        Self {
            item: product.item,
            name: product.name,
            unit_price: product.unit_price,
            quantity: 1,
            days,
            available_quantity: match product.item.kind {
                ItemKind::Inventory => product.available_quantity,
                ItemKind::Outsourced => None,
            },
        }
    }

    pub fn line_total(&self) -> BigDecimal {
        line_total(&self.unit_price, self.quantity, self.days)
    }

    pub fn set_quantity(&mut self, quantity: i32) {
        self.quantity = quantity;
    }

    pub fn set_unit_price(&mut self, unit_price: BigDecimal) {
        self.unit_price = unit_price;
    }

    pub fn set_days(&mut self, days: i32) {
        self.days = days;
    }
}
