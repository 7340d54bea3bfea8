//! Order Aggregate
//!
//! An order is created from a cart at checkout with frozen unit prices. While
//! it is `Pending` its lines may be re-quantified or removed and the total is
//! recomputed after every change. `Cancelled` is terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use crate::domain::aggregates::cart::Cart;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{ItemId, Money, OrderId, OrderLineId, Quantity, UserId};

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    placed_at: DateTime<Utc>,
    status: OrderStatus,
    customer: CustomerDetails,
    total: Money,
    lines: Vec<OrderLine>,
    version: i64,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> Money { self.unit_price.times(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub shipping_address: String,
}

impl CustomerDetails {
    pub fn new(name: &str, phone: &str, shipping_address: &str) -> Result<Self, OrderError> {
        let required = |value: &str, field: &'static str| {
            let value = value.trim();
            if value.is_empty() { Err(OrderError::MissingCustomerField(field)) } else { Ok(value.to_string()) }
        };
        Ok(Self {
            name: required(name, "name")?,
            phone: required(phone, "phone")?,
            shipping_address: required(shipping_address, "shipping address")?,
        })
    }
}

/// Known statuses plus free-form labels an administrator may enter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Custom(String),
}

impl OrderStatus {
    /// Known labels match case-insensitively, so a typed "cancelled" is still terminal.
    pub fn parse(label: &str) -> Result<Self, OrderError> {
        let label = label.trim();
        let status = match label.to_ascii_lowercase().as_str() {
            "" => return Err(OrderError::BlankStatus),
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Custom(label.to_string()),
        };
        Ok(status)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Custom(label) => label,
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Cancelled) }
    pub fn is_editable(&self) -> bool { matches!(self, Self::Pending) }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl TryFrom<String> for OrderStatus {
    type Error = OrderError;
    fn try_from(label: String) -> Result<Self, Self::Error> { Self::parse(&label) }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self { status.as_str().to_string() }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LineEdit {
    SetQuantity { line_id: OrderLineId, quantity: Quantity },
    Remove { line_id: OrderLineId },
}

impl LineEdit {
    pub fn line_id(&self) -> OrderLineId {
        match self { Self::SetQuantity { line_id, .. } | Self::Remove { line_id } => *line_id }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinesAfterEdit { Remaining, Emptied }

/// Everything a store needs to rebuild an order it persisted earlier.
#[derive(Clone, Debug)]
pub struct OrderParts {
    pub id: OrderId,
    pub user_id: UserId,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer: CustomerDetails,
    pub total: Money,
    pub lines: Vec<OrderLine>,
    pub version: i64,
}

impl Order {
    pub fn place(user_id: UserId, customer: CustomerDetails, cart: &Cart) -> Result<Self, OrderError> {
        if cart.is_empty() { return Err(OrderError::NoLines); }
        let lines = cart.lines().iter().map(|l| OrderLine {
            id: OrderLineId::generate(), item_id: l.item_id, item_name: l.name.clone(),
            quantity: l.quantity, unit_price: l.unit_price,
        }).collect();
        let mut order = Self {
            id: OrderId::generate(), user_id, placed_at: Utc::now(), status: OrderStatus::Pending,
            customer, total: Money::ZERO, lines, version: 0, events: vec![],
        };
        order.recalculate();
        order.raise_event(OrderEvent::Placed {
            order_id: order.id, user_id: order.user_id.clone(), total: order.total, lines: order.lines.len(),
        });
        Ok(order)
    }

    pub fn from_parts(parts: OrderParts) -> Self {
        Self {
            id: parts.id, user_id: parts.user_id, placed_at: parts.placed_at, status: parts.status,
            customer: parts.customer, total: parts.total, lines: parts.lines, version: parts.version, events: vec![],
        }
    }

    pub fn id(&self) -> OrderId { self.id }
    pub fn user_id(&self) -> &UserId { &self.user_id }
    pub fn placed_at(&self) -> DateTime<Utc> { self.placed_at }
    pub fn status(&self) -> &OrderStatus { &self.status }
    pub fn customer(&self) -> &CustomerDetails { &self.customer }
    pub fn total(&self) -> Money { self.total }
    pub fn lines(&self) -> &[OrderLine] { &self.lines }
    pub fn version(&self) -> i64 { self.version }

    /// Administrative status change; anything goes except leaving `Cancelled`.
    pub fn update_status(&mut self, status: OrderStatus) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(self.invalid("change the status of"));
        }
        let from = std::mem::replace(&mut self.status, status);
        self.raise_event(OrderEvent::StatusChanged {
            order_id: self.id, from: from.to_string(), to: self.status.to_string(),
        });
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.ensure_editable("cancel")?;
        self.status = OrderStatus::Cancelled;
        self.raise_event(OrderEvent::Cancelled { order_id: self.id });
        Ok(())
    }

    /// Applies the whole batch or nothing. An emptied order should be deleted by the caller.
    pub fn apply_edits(&mut self, edits: &[LineEdit]) -> Result<LinesAfterEdit, OrderError> {
        self.ensure_editable("edit the lines of")?;
        let mut lines = self.lines.clone();
        for edit in edits {
            let pos = lines.iter().position(|l| l.id == edit.line_id()).ok_or(OrderError::LineNotFound(edit.line_id()))?;
            match edit {
                LineEdit::SetQuantity { quantity, .. } => lines[pos].quantity = *quantity,
                LineEdit::Remove { .. } => { lines.remove(pos); }
            }
        }
        self.lines = lines;
        self.recalculate();
        if self.lines.is_empty() {
            self.raise_event(OrderEvent::Deleted { order_id: self.id });
            return Ok(LinesAfterEdit::Emptied);
        }
        self.raise_event(OrderEvent::LinesEdited { order_id: self.id, total: self.total });
        Ok(LinesAfterEdit::Remaining)
    }

    /// Returns `Ok(false)` when the line does not exist.
    pub fn set_line_quantity(&mut self, line_id: OrderLineId, quantity: Quantity) -> Result<bool, OrderError> {
        self.ensure_editable("change a line quantity of")?;
        let Some(line) = self.lines.iter_mut().find(|l| l.id == line_id) else { return Ok(false) };
        line.quantity = quantity;
        self.recalculate();
        self.raise_event(OrderEvent::LinesEdited { order_id: self.id, total: self.total });
        Ok(true)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    pub(crate) fn mark_saved(&mut self, version: i64) { self.version = version; }

    fn ensure_editable(&self, action: &'static str) -> Result<(), OrderError> {
        if self.status.is_editable() { Ok(()) } else { Err(self.invalid(action)) }
    }

    fn invalid(&self, action: &'static str) -> OrderError {
        OrderError::InvalidTransition { status: self.status.clone(), action }
    }

    fn recalculate(&mut self) { self.total = self.lines.iter().map(OrderLine::line_total).sum(); }
    fn raise_event(&mut self, e: OrderEvent) { self.events.push(DomainEvent::Order(e)); }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("cannot {action} an order that is {status}")]
    InvalidTransition { status: OrderStatus, action: &'static str },
    #[error("order line {0} not found")]
    LineNotFound(OrderLineId),
    #[error("an order needs at least one line")]
    NoLines,
    #[error("status label must not be blank")]
    BlankStatus,
    #[error("customer {0} is required")]
    MissingCustomerField(&'static str),
}
