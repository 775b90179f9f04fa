use std::borrow::Cow;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::product::{NAME_MAX_LEN, NewProduct, Product, UpdateProduct};
use crate::forms::errors::FieldErrors;

const NAME_MAX_LEN_VALIDATOR: u64 = NAME_MAX_LEN as u64;

pub const FIELD_NAME: &str = "name";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_QTY: &str = "qty";

pub const NAME_REQUIRED: &str = "name is required";
pub const NAME_TOO_LONG: &str = "name exceeds 255 characters";
pub const NAME_TAKEN: &str = "name already in use";
pub const AMOUNT_REQUIRED: &str = "amount is required";
pub const AMOUNT_NOT_NUMERIC: &str = "amount must be numeric";
pub const AMOUNT_NEGATIVE: &str = "amount must not be negative";
pub const QTY_REQUIRED: &str = "qty is required";
pub const QTY_NOT_WHOLE: &str = "qty must be a whole number";
pub const QTY_NEGATIVE: &str = "qty must not be negative";

/// A submitted value that may arrive as text (form posts) or as a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(serde_json::Number),
    Text(String),
}

impl FormValue {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FormValue::Number(number) => Cow::Owned(number.to_string()),
            FormValue::Text(text) => Cow::Borrowed(text.as_str()),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        FormValue::Number(value.into())
    }
}

/// Raw product input as submitted by the create and edit forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProductForm {
    #[validate(length(max = NAME_MAX_LEN_VALIDATOR, message = "name exceeds 255 characters"))]
    pub name: Option<String>,
    pub amount: Option<FormValue>,
    pub qty: Option<FormValue>,
}

/// Normalized, type-correct product fields produced by a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPayload {
    pub name: String,
    pub amount_cents: i64,
    pub qty: i32,
}

impl ProductPayload {
    pub fn into_new_product(self) -> NewProduct {
        NewProduct::new(self.name, self.amount_cents, self.qty)
    }

    pub fn into_update_product(self) -> UpdateProduct {
        UpdateProduct::new(self.name, self.amount_cents, self.qty)
    }
}

impl ProductForm {
    pub fn new(
        name: impl Into<String>,
        amount: impl Into<FormValue>,
        qty: impl Into<FormValue>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            amount: Some(amount.into()),
            qty: Some(qty.into()),
        }
    }

    /// Prefill the edit form with the stored values of `product`.
    pub fn from_product(product: &Product) -> Self {
        Self::new(
            product.name.clone(),
            product.amount(),
            product.qty.to_string(),
        )
    }

    /// The submitted name, or `None` when it is missing or blank.
    pub fn name_value(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Check every field rule. `name_taken` is the outcome of the uniqueness
    /// probe for [`Self::name_value`]; it is ignored when the name is missing.
    pub fn into_payload(self, name_taken: bool) -> Result<ProductPayload, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.check_name(name_taken, &mut errors);
        let amount = collect(FIELD_AMOUNT, check_amount(self.amount.as_ref()), &mut errors);
        let qty = collect(FIELD_QTY, check_qty(self.qty.as_ref()), &mut errors);

        match (name, amount, qty) {
            (Some(name), Some(amount_cents), Some(qty)) if errors.is_empty() => {
                Ok(ProductPayload {
                    name,
                    amount_cents,
                    qty,
                })
            }
            _ => Err(errors),
        }
    }

    fn check_name(&self, name_taken: bool, errors: &mut FieldErrors) -> Option<String> {
        let Some(name) = self.name_value() else {
            errors.add(FIELD_NAME, NAME_REQUIRED);
            return None;
        };

        let mut name_errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(validation) => FieldErrors::from(validation),
        };
        if name_taken {
            name_errors.add(FIELD_NAME, NAME_TAKEN);
        }

        if name_errors.is_empty() {
            Some(name.to_string())
        } else {
            errors.merge(name_errors);
            None
        }
    }
}

fn collect<T>(
    field: &str,
    result: Result<T, Vec<&'static str>>,
    errors: &mut FieldErrors,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(messages) => {
            for message in messages {
                errors.add(field, message);
            }
            None
        }
    }
}

fn present_text(value: Option<&FormValue>) -> Option<Cow<'_, str>> {
    value
        .map(FormValue::as_text)
        .filter(|text| !text.trim().is_empty())
}

/// Parse a plain or scientific decimal literal, ignoring surrounding whitespace.
fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    // Digit separators are not part of a numeric literal.
    if text.contains('_') {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn check_amount(value: Option<&FormValue>) -> Result<i64, Vec<&'static str>> {
    let Some(text) = present_text(value) else {
        return Err(vec![AMOUNT_REQUIRED]);
    };
    let Some(amount) = parse_decimal(&text) else {
        return Err(vec![AMOUNT_NOT_NUMERIC]);
    };
    if amount < Decimal::ZERO {
        return Err(vec![AMOUNT_NEGATIVE]);
    }

    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| vec![AMOUNT_NOT_NUMERIC])
}

fn check_qty(value: Option<&FormValue>) -> Result<i32, Vec<&'static str>> {
    let Some(text) = present_text(value) else {
        return Err(vec![QTY_REQUIRED]);
    };
    let Some(qty) = parse_decimal(&text) else {
        return Err(vec![QTY_NOT_WHOLE]);
    };

    // Text must be an integer literal; a JSON number only needs a zero fraction.
    let integral = match value {
        Some(FormValue::Number(_)) => qty.fract().is_zero(),
        _ => !text.contains(['.', 'e', 'E']),
    };
    let whole = integral
        .then(|| qty.to_i64())
        .flatten()
        .and_then(|value| i32::try_from(value).ok());

    let mut messages = Vec::new();
    if whole.is_none() {
        messages.push(QTY_NOT_WHOLE);
    }
    if qty < Decimal::ZERO {
        messages.push(QTY_NEGATIVE);
    }

    match whole {
        Some(qty) if messages.is_empty() => Ok(qty),
        _ => Err(messages),
    }
}
