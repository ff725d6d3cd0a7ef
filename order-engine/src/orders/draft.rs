//! Line list of an order that does not exist yet

use super::error::ValidationError;
use super::lines::{self, LinePricer};
use crate::order_money::{MAX_AMOUNT, calculate_totals, try_calculate_totals};
use rust_decimal::Decimal;
use shared::order::{LineItem, NewOrder, OrderForm, OrderTotals};

/// Draft of a new order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    lines: Vec<LineItem>,
    editing_index: Option<usize>,
}

/// A draft that passed validation, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub order: NewOrder,
    pub lines: Vec<LineItem>,
    /// Deposit to record with the order, if any
    pub abono: Option<Decimal>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing_index
    }

    pub fn select_line(&mut self, index: usize) -> Result<(), ValidationError> {
        lines::select_line(&self.lines, &mut self.editing_index, index)
    }

    pub fn add_or_update_line(
        &mut self,
        pricer: &LinePricer<'_>,
        product_id: i64,
        quantity: Decimal,
    ) -> Result<(), ValidationError> {
        let line = pricer.price(product_id, quantity)?;
        lines::upsert_line(&mut self.lines, &mut self.editing_index, line)
    }

    pub fn remove_line(&mut self, index: usize) -> Result<LineItem, ValidationError> {
        lines::remove_line(&mut self.lines, &mut self.editing_index, index)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.editing_index = None;
    }

    pub fn totals(&self, discount: Decimal, vat_rate: Decimal) -> OrderTotals {
        calculate_totals(&self.lines, discount, vat_rate)
    }

    /// Check the header form against the draft lines
    ///
    /// Checks run in form order: client, date, seller, lines, discount,
    /// abono, total. The first failure is returned.
    pub fn validate(&self, form: &OrderForm, vat_rate: Decimal) -> Result<ValidatedOrder, ValidationError> {
        let client_id = form.client_id.ok_or(ValidationError::MissingField("client"))?;
        let date = form.date.ok_or(ValidationError::MissingField("date"))?;
        let seller_id = form.seller_id.ok_or(ValidationError::MissingField("seller"))?;

        if self.lines.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        check_amount("discount", form.discount)?;
        check_amount("abono", form.abono)?;

        let totals = try_calculate_totals(&self.lines, form.discount, vat_rate)
            .ok_or(ValidationError::Overflow("order total"))?;
        if totals.total <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveTotal(totals.total));
        }

        Ok(ValidatedOrder {
            order: NewOrder {
                date,
                client_id,
                seller_id,
                discount: form.discount,
                totals,
            },
            lines: self.lines.clone(),
            abono: (form.abono > Decimal::ZERO).then_some(form.abono),
        })
    }
}

fn check_amount(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount { field, value });
    }
    if value > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            field,
            value,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}
