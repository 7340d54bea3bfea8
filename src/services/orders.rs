//! Order lifecycle engine.
//!
//! Each operation resolves the caller, loads the order, runs the
//! owner-or-admin check, applies the aggregate transition and saves with an
//! optimistic version check. Guards run before anything is written, and
//! events are published only once the store has committed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use crate::access::Caller;
use crate::domain::aggregates::{CustomerDetails, LineEdit, LinesAfterEdit, Order, OrderStatus};
use crate::domain::value_objects::{OrderId, OrderLineId, Quantity};
use crate::publisher::EventPublisher;
use crate::services::cart::CartService;
use crate::store::OrderStore;
use crate::{BackofficeError, Result};

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutDetails {
    pub customer_name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    Updated { order: Order },
    Deleted { order_id: OrderId },
}

#[derive(Clone)]
pub struct OrderEngine {
    orders: Arc<dyn OrderStore>,
    carts: CartService,
    events: Arc<dyn EventPublisher>,
}

impl OrderEngine {
    pub fn new(orders: Arc<dyn OrderStore>, carts: CartService, events: Arc<dyn EventPublisher>) -> Self {
        Self { orders, carts, events }
    }

    /// Turns the caller's cart into a `Pending` order. The cart is cleared in
    /// the same transaction, so a failed insert leaves it untouched. A cart
    /// changed after it was read fails with `Conflict` and is kept as is.
    #[instrument(skip(self, caller, details), fields(user = ?caller.current_user()))]
    pub async fn checkout(&self, caller: &Caller, details: CheckoutDetails) -> Result<Order> {
        let user = caller.require_user()?;
        let (cart, payload) = self.carts.snapshot_for(user).await?;
        let Some(payload) = payload.filter(|_| !cart.is_empty()) else { return Err(BackofficeError::EmptyCart) };
        let customer = CustomerDetails::new(&details.customer_name, &details.phone, &details.address)?;
        let mut order = Order::place(user.clone(), customer, &cart)?;
        self.orders.place_order(&order, &payload).await?;
        info!(order_id = %order.id(), total = %order.total(), lines = order.lines().len(), "order placed");
        self.events.publish_all(order.take_events()).await;
        Ok(order)
    }

    pub async fn details(&self, caller: &Caller, id: OrderId) -> Result<Order> {
        self.load_authorized(caller, id).await
    }

    pub async fn my_orders(&self, caller: &Caller) -> Result<Vec<Order>> {
        let user = caller.require_user()?;
        self.orders.orders_for_user(user).await
    }

    pub async fn all_orders(&self, caller: &Caller) -> Result<Vec<Order>> {
        caller.require_admin()?;
        self.orders.all_orders().await
    }

    /// Administrative status change. Any label is accepted unless the order is already cancelled.
    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn update_status(&self, caller: &Caller, id: OrderId, new_status: &str) -> Result<Order> {
        caller.require_admin()?;
        let status = OrderStatus::parse(new_status)?;
        let mut order = self.load_authorized(caller, id).await?;
        order.update_status(status)?;
        self.persist(order).await
    }

    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn cancel(&self, caller: &Caller, id: OrderId) -> Result<Order> {
        let mut order = self.load_authorized(caller, id).await?;
        order.cancel()?;
        self.persist(order).await
    }

    /// Applies a batch of line edits atomically; an emptied order is deleted.
    #[instrument(skip(self, caller, edits), fields(user = ?caller.current_user(), edits = edits.len()))]
    pub async fn edit_lines(&self, caller: &Caller, id: OrderId, edits: &[LineEdit]) -> Result<EditOutcome> {
        let mut order = self.load_authorized(caller, id).await?;
        match order.apply_edits(edits)? {
            LinesAfterEdit::Remaining => Ok(EditOutcome::Updated { order: self.persist(order).await? }),
            LinesAfterEdit::Emptied => {
                self.orders.delete_order(id, order.version()).await?;
                info!(order_id = %id, "last line removed, order deleted");
                self.events.publish_all(order.take_events()).await;
                Ok(EditOutcome::Deleted { order_id: id })
            }
        }
    }

    pub async fn remove_line(&self, caller: &Caller, id: OrderId, line_id: OrderLineId) -> Result<EditOutcome> {
        self.edit_lines(caller, id, &[LineEdit::Remove { line_id }]).await
    }

    /// Rejected unless the order is `Pending`; a missing line leaves the order as it was.
    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn update_line_quantity(
        &self,
        caller: &Caller,
        id: OrderId,
        line_id: OrderLineId,
        quantity: Quantity,
    ) -> Result<Order> {
        let mut order = self.load_authorized(caller, id).await?;
        if !order.set_line_quantity(line_id, quantity)? {
            warn!(order_id = %id, line_id = %line_id, "line not on order, nothing changed");
            return Ok(order);
        }
        self.persist(order).await
    }

    async fn load_authorized(&self, caller: &Caller, id: OrderId) -> Result<Order> {
        caller.require_user()?;
        let order = self.orders.load_order(id).await?
            .ok_or_else(|| BackofficeError::NotFound(format!("order {id}")))?;
        caller.authorize_order(order.user_id())?;
        Ok(order)
    }

    async fn persist(&self, mut order: Order) -> Result<Order> {
        let version = self.orders.save_order(&order).await?;
        order.mark_saved(version);
        info!(order_id = %order.id(), status = %order.status(), total = %order.total(), "order saved");
        self.events.publish_all(order.take_events()).await;
        Ok(order)
    }
}
