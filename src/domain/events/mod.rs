//! Domain events
use crate::domain::value_objects::{ItemId, Money, OrderId, UserId};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Item(ItemEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemEvent {
    Created { item_id: ItemId, price: Money },
    Updated { item_id: ItemId, price: Money },
    Deleted { item_id: ItemId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: OrderId, user_id: UserId, total: Money, lines: usize },
    StatusChanged { order_id: OrderId, from: String, to: String },
    Cancelled { order_id: OrderId },
    LinesEdited { order_id: OrderId, total: Money },
    Deleted { order_id: OrderId },
}

impl DomainEvent {
    /// Subject suffix used when the event leaves the process.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Item(ItemEvent::Created { .. }) => "item.created",
            Self::Item(ItemEvent::Updated { .. }) => "item.updated",
            Self::Item(ItemEvent::Deleted { .. }) => "item.deleted",
            Self::Order(OrderEvent::Placed { .. }) => "order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "order.status_changed",
            Self::Order(OrderEvent::Cancelled { .. }) => "order.cancelled",
            Self::Order(OrderEvent::LinesEdited { .. }) => "order.lines_edited",
            Self::Order(OrderEvent::Deleted { .. }) => "order.deleted",
        }
    }
}
