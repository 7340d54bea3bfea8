//! Session cart operations. Every change rewrites the whole cart payload.

use std::sync::Arc;
use tracing::{debug, instrument};
use crate::access::Caller;
use crate::domain::aggregates::{Cart, CartLine};
use crate::domain::value_objects::{ItemId, Quantity, UserId};
use crate::store::{CartSessionStore, RegistryStore};
use crate::{BackofficeError, Result};

#[derive(Clone)]
pub struct CartService {
    sessions: Arc<dyn CartSessionStore>,
    registry: Arc<dyn RegistryStore>,
}

impl CartService {
    pub fn new(sessions: Arc<dyn CartSessionStore>, registry: Arc<dyn RegistryStore>) -> Self {
        Self { sessions, registry }
    }

    pub(crate) async fn load_for(&self, user: &UserId) -> Result<Cart> {
        Ok(self.snapshot_for(user).await?.0)
    }

    /// The decoded cart together with the raw payload it came from.
    pub(crate) async fn snapshot_for(&self, user: &UserId) -> Result<(Cart, Option<Vec<u8>>)> {
        let payload = self.sessions.load_cart(user).await?;
        Ok((Cart::decode(payload.as_deref()), payload))
    }

    async fn save_for(&self, user: &UserId, cart: &Cart) -> Result<()> {
        if cart.is_empty() { return self.sessions.clear_cart(user).await; }
        self.sessions.save_cart(user, cart.encode()?).await
    }

    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn add_item(&self, caller: &Caller, item_id: ItemId, quantity: i64) -> Result<Cart> {
        let user = caller.require_user()?;
        let quantity = Quantity::new(quantity)?;
        let item = self.registry.get_item(item_id).await?
            .ok_or_else(|| BackofficeError::NotFound(format!("item {item_id}")))?;
        let mut cart = self.load_for(user).await?;
        cart.add_item(CartLine { item_id, name: item.name, quantity, unit_price: item.price });
        self.save_for(user, &cart).await?;
        debug!(lines = cart.line_count(), "item added to cart");
        Ok(cart)
    }

    /// Quantities below one and items not in the cart are ignored.
    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn set_quantity(&self, caller: &Caller, item_id: ItemId, quantity: i64) -> Result<Cart> {
        let user = caller.require_user()?;
        let mut cart = self.load_for(user).await?;
        if cart.set_quantity(item_id, quantity) {
            self.save_for(user, &cart).await?;
        } else {
            debug!("cart quantity update ignored");
        }
        Ok(cart)
    }

    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn remove_item(&self, caller: &Caller, item_id: ItemId) -> Result<Cart> {
        let user = caller.require_user()?;
        let mut cart = self.load_for(user).await?;
        if cart.remove_item(item_id) {
            self.save_for(user, &cart).await?;
        }
        Ok(cart)
    }

    pub async fn get_cart(&self, caller: &Caller) -> Result<Cart> {
        let user = caller.require_user()?;
        self.load_for(user).await
    }

    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn clear(&self, caller: &Caller) -> Result<()> {
        let user = caller.require_user()?;
        self.sessions.clear_cart(user).await
    }
}
