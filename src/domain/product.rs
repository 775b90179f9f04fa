use chrono::{NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::pagination::Pagination;

/// Maximum number of characters allowed in a product name.
pub const NAME_MAX_LEN: usize = 255;

/// Domain representation of an inventory product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Identifier assigned by the store; never reused.
    pub id: i32,
    /// Unique product name.
    pub name: String,
    /// Price in hundredths of the currency unit.
    pub amount_cents: i64,
    /// Units in stock.
    pub qty: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Price rendered with two fractional digits, e.g. `150000.00`.
    pub fn amount(&self) -> String {
        format_amount(self.amount_cents)
    }
}

/// Payload required to insert a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub amount_cents: i64,
    pub qty: i32,
    /// Timestamp stored as both `created_at` and `updated_at`.
    pub created_at: NaiveDateTime,
}

impl NewProduct {
    /// Build a new product payload stamped with the current time.
    pub fn new(name: impl Into<String>, amount_cents: i64, qty: i32) -> Self {
        Self {
            name: name.into(),
            amount_cents,
            qty,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Full replacement of the mutable product fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProduct {
    pub name: String,
    pub amount_cents: i64,
    pub qty: i32,
    pub updated_at: NaiveDateTime,
}

impl UpdateProduct {
    /// Build an update payload stamped with the current time.
    pub fn new(name: impl Into<String>, amount_cents: i64, qty: i32) -> Self {
        Self {
            name: name.into(),
            amount_cents,
            qty,
            updated_at: Utc::now().naive_utc(),
        }
    }
}

/// Query definition used to list products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListQuery {
    /// Substring the product name must contain.
    pub search: Option<String>,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl ProductListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter the results by a substring of the name. Blank terms are ignored.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.is_empty() { None } else { Some(term) };
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Amount in cents as a two-place decimal.
pub fn amount_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format an amount in cents as a plain decimal string.
pub fn format_amount(cents: i64) -> String {
    amount_decimal(cents).to_string()
}

/// Format the whole currency units of an amount with `.` thousands separators,
/// e.g. `150000.00` becomes `150.000`.
pub fn format_amount_grouped(cents: i64) -> String {
    let units = amount_decimal(cents)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if units < Decimal::ZERO { "-" } else { "" };
    let digits = units.mantissa().unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}")
}
