//! Staged-edit state machine for a committed order
//!
//! ```text
//! Viewing ──begin_edit──▶ Editing { staged, dirty, editing_index }
//!    ▲                        │
//!    ├──────cancel_edit───────┤
//!    └──────apply_commit──────┘
//! ```
//!
//! Line mutations only touch the staged copy. The committed lines change
//! in [`EditSession::apply_commit`], which the manager calls after the
//! store has accepted the [`CommitPlan`] built by
//! [`EditSession::prepare_commit`].

use super::error::ValidationError;
use super::lines::{self, LinePricer};
use crate::order_money::{amount_due, calculate_totals, try_calculate_totals};
use rust_decimal::Decimal;
use shared::order::{LineItem, OrderHeader, OrderTotals, PaymentRecord};

/// A persisted order with its lines and payments
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub header: OrderHeader,
    pub lines: Vec<LineItem>,
    pub payments: Vec<PaymentRecord>,
}

impl Order {
    pub fn id(&self) -> i64 {
        self.header.id
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.header.totals
    }

    /// Total minus all recorded abonos
    pub fn amount_due(&self) -> Decimal {
        amount_due(&self.header.totals, &self.payments)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Viewing,
    Editing,
}

#[derive(Debug, Clone, PartialEq)]
enum EditState {
    Viewing,
    Editing {
        staged: Vec<LineItem>,
        dirty: bool,
        editing_index: Option<usize>,
    },
}

/// Writes that make a staged edit permanent
#[derive(Debug, Clone, PartialEq)]
pub struct CommitPlan {
    pub order_id: i64,
    pub lines: Vec<LineItem>,
    pub totals: OrderTotals,
}

/// Edit session over one committed order
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    order: Order,
    state: EditState,
}

impl EditSession {
    /// Start viewing a committed order
    pub fn new(order: Order) -> Self {
        Self {
            order,
            state: EditState::Viewing,
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn committed_lines(&self) -> &[LineItem] {
        &self.order.lines
    }

    /// Lines as currently shown: the staged copy while editing
    pub fn lines(&self) -> &[LineItem] {
        match &self.state {
            EditState::Viewing => &self.order.lines,
            EditState::Editing { staged, .. } => staged,
        }
    }

    pub fn mode(&self) -> EditMode {
        match self.state {
            EditState::Viewing => EditMode::Viewing,
            EditState::Editing { .. } => EditMode::Editing,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.mode() == EditMode::Editing
    }

    /// Staged lines differ from what was loaded
    pub fn is_dirty(&self) -> bool {
        matches!(self.state, EditState::Editing { dirty: true, .. })
    }

    pub fn editing_index(&self) -> Option<usize> {
        match self.state {
            EditState::Editing { editing_index, .. } => editing_index,
            EditState::Viewing => None,
        }
    }

    pub fn begin_edit(&mut self) -> Result<(), ValidationError> {
        if self.is_editing() {
            return Err(ValidationError::AlreadyEditing);
        }
        self.state = EditState::Editing {
            staged: self.order.lines.clone(),
            dirty: false,
            editing_index: None,
        };
        Ok(())
    }

    /// Select a staged line; the next upsert replaces it
    pub fn select_line(&mut self, index: usize) -> Result<(), ValidationError> {
        let EditState::Editing {
            staged,
            editing_index,
            ..
        } = &mut self.state
        else {
            return Err(ValidationError::NotEditing);
        };
        lines::select_line(staged, editing_index, index)
    }

    /// Price a product selection and add it to the staged lines
    ///
    /// Replaces the selected line if there is one, otherwise appends.
    pub fn add_or_update_line(
        &mut self,
        pricer: &LinePricer<'_>,
        product_id: i64,
        quantity: Decimal,
    ) -> Result<(), ValidationError> {
        let EditState::Editing {
            staged,
            dirty,
            editing_index,
        } = &mut self.state
        else {
            return Err(ValidationError::NotEditing);
        };
        let line = pricer.price(product_id, quantity)?;
        lines::upsert_line(staged, editing_index, line)?;
        *dirty = true;
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<LineItem, ValidationError> {
        let EditState::Editing {
            staged,
            dirty,
            editing_index,
        } = &mut self.state
        else {
            return Err(ValidationError::NotEditing);
        };
        let removed = lines::remove_line(staged, editing_index, index)?;
        *dirty = true;
        Ok(removed)
    }

    /// Discard staged changes; no-op while viewing
    pub fn cancel_edit(&mut self) {
        self.state = EditState::Viewing;
    }

    /// Totals of the lines as currently shown
    pub fn current_totals(&self, vat_rate: Decimal) -> OrderTotals {
        calculate_totals(self.lines(), self.order.header.discount, vat_rate)
    }

    /// Validate the staged edit and compute the writes that commit it
    pub fn prepare_commit(&self, vat_rate: Decimal) -> Result<CommitPlan, ValidationError> {
        let EditState::Editing { staged, .. } = &self.state else {
            return Err(ValidationError::NotEditing);
        };
        if staged.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        let totals = try_calculate_totals(staged, self.order.header.discount, vat_rate)
            .ok_or(ValidationError::Overflow("order total"))?;
        if totals.total <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveTotal(totals.total));
        }
        Ok(CommitPlan {
            order_id: self.order.id(),
            lines: staged.clone(),
            totals,
        })
    }

    /// Adopt a plan the store has accepted and return to viewing
    pub fn apply_commit(&mut self, plan: CommitPlan) {
        debug_assert_eq!(plan.order_id, self.order.id());
        self.order.lines = plan.lines;
        self.order.header.totals = plan.totals;
        self.state = EditState::Viewing;
    }
}
