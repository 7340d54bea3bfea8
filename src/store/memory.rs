//! In-process store. One lock guards everything, which makes checkout and
//! order saves trivially atomic.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use crate::domain::aggregates::{Catalog, Item, ItemInput, Order, Supplier};
use crate::domain::value_objects::{CatalogId, ItemId, OrderId, SupplierId, UserId};
use crate::store::{CartSessionStore, OrderStore, RegistryStore};
use crate::{BackofficeError, Result};

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    catalogs: BTreeMap<CatalogId, Catalog>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    items: BTreeMap<ItemId, Item>,
    carts: HashMap<UserId, Vec<u8>>,
    orders: HashMap<OrderId, Order>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

/// Stored copies never carry pending events.
fn detached(order: &Order) -> Order {
    let mut copy = order.clone();
    copy.take_events();
    copy
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.placed_at().cmp(&a.placed_at()).then_with(|| b.id().cmp(&a.id())));
    orders
}

fn check_version(stored: &Order, expected: i64) -> Result<()> {
    if stored.version() != expected {
        return Err(BackofficeError::Conflict(format!("order {} was modified concurrently", stored.id())));
    }
    Ok(())
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn list_catalogs(&self) -> Result<Vec<Catalog>> {
        let mut all: Vec<Catalog> = self.state.lock().await.catalogs.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn get_catalog(&self, id: CatalogId) -> Result<Option<Catalog>> {
        Ok(self.state.lock().await.catalogs.get(&id).cloned())
    }

    async fn insert_catalog(&self, catalog: &Catalog) -> Result<()> {
        self.state.lock().await.catalogs.insert(catalog.id, catalog.clone());
        Ok(())
    }

    async fn update_catalog(&self, catalog: &Catalog) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.catalogs.get_mut(&catalog.id) {
            Some(existing) => { *existing = catalog.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn delete_catalog(&self, id: CatalogId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let removed = state.catalogs.remove(&id).is_some();
        state.items.retain(|_, item| item.catalog_id != id);
        Ok(removed)
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        let mut all: Vec<Supplier> = self.state.lock().await.suppliers.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>> {
        Ok(self.state.lock().await.suppliers.get(&id).cloned())
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<()> {
        self.state.lock().await.suppliers.insert(supplier.id, supplier.clone());
        Ok(())
    }

    async fn update_supplier(&self, supplier: &Supplier) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.suppliers.get_mut(&supplier.id) {
            Some(existing) => { *existing = supplier.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn delete_supplier(&self, id: SupplierId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let removed = state.suppliers.remove(&id).is_some();
        state.items.retain(|_, item| item.supplier_id != id);
        Ok(removed)
    }

    async fn list_items(&self, catalog: Option<CatalogId>) -> Result<Vec<Item>> {
        let state = self.state.lock().await;
        let mut items: Vec<Item> = state.items.values()
            .filter(|item| catalog.map_or(true, |c| item.catalog_id == c))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.state.lock().await.items.get(&id).cloned())
    }

    async fn insert_item(&self, item: &Item) -> Result<()> {
        self.state.lock().await.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&self, id: ItemId, input: &ItemInput) -> Result<Option<Item>> {
        let mut state = self.state.lock().await;
        let Some(item) = state.items.get_mut(&id) else { return Ok(None) };
        item.apply_update(input.clone());
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool> {
        Ok(self.state.lock().await.items.remove(&id).is_some())
    }
}

#[async_trait]
impl CartSessionStore for MemoryStore {
    async fn load_cart(&self, user: &UserId) -> Result<Option<Vec<u8>>> {
        Ok(self.state.lock().await.carts.get(user).cloned())
    }

    async fn save_cart(&self, user: &UserId, payload: Vec<u8>) -> Result<()> {
        self.state.lock().await.carts.insert(user.clone(), payload);
        Ok(())
    }

    async fn clear_cart(&self, user: &UserId) -> Result<()> {
        self.state.lock().await.carts.remove(user);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn load_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user: &UserId) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(newest_first(state.orders.values().filter(|o| o.user_id() == user).cloned().collect()))
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        Ok(newest_first(self.state.lock().await.orders.values().cloned().collect()))
    }

    async fn place_order(&self, order: &Order, cart_payload: &[u8]) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.orders.contains_key(&order.id()) {
            return Err(BackofficeError::Conflict(format!("order {} already exists", order.id())));
        }
        if state.carts.get(order.user_id()).map(Vec::as_slice) != Some(cart_payload) {
            return Err(BackofficeError::Conflict(format!("cart of {} changed during checkout", order.user_id())));
        }
        state.orders.insert(order.id(), detached(order));
        state.carts.remove(order.user_id());
        Ok(())
    }

    async fn save_order(&self, order: &Order) -> Result<i64> {
        let mut state = self.state.lock().await;
        let stored = state.orders.get_mut(&order.id())
            .ok_or_else(|| BackofficeError::NotFound(format!("order {}", order.id())))?;
        check_version(stored, order.version())?;
        let version = order.version() + 1;
        let mut copy = detached(order);
        copy.mark_saved(version);
        *stored = copy;
        Ok(version)
    }

    async fn delete_order(&self, id: OrderId, expected_version: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        let stored = state.orders.get(&id).ok_or_else(|| BackofficeError::NotFound(format!("order {id}")))?;
        check_version(stored, expected_version)?;
        state.orders.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Cart, CartLine, CatalogInput, CustomerDetails};
    use crate::domain::value_objects::{Money, Quantity};

    fn placed(user: &UserId) -> Order {
        let mut cart = Cart::new();
        cart.add_item(CartLine { item_id: ItemId::generate(), name: "x".into(), quantity: Quantity::ONE, unit_price: Money::ZERO });
        let customer = CustomerDetails::new("A", "1", "addr").unwrap();
        Order::place(user.clone(), customer, &cart).unwrap()
    }

    #[tokio::test]
    async fn test_place_order_clears_cart() {
        let store = MemoryStore::new();
        let user = UserId::new("u1").unwrap();
        store.save_cart(&user, b"[]".to_vec()).await.unwrap();
        let order = placed(&user);
        store.place_order(&order, b"[]").await.unwrap();
        assert!(store.load_cart(&user).await.unwrap().is_none());
        assert!(store.load_order(order.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = MemoryStore::new();
        let user = UserId::new("u1").unwrap();
        let order = placed(&user);
        store.save_cart(&user, b"[1]".to_vec()).await.unwrap();
        store.place_order(&order, b"[1]").await.unwrap();
        let first = store.load_order(order.id()).await.unwrap().unwrap();
        let second = first.clone();
        assert_eq!(store.save_order(&first).await.unwrap(), 1);
        assert!(matches!(store.save_order(&second).await, Err(BackofficeError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_stored_orders_carry_no_events() {
        let store = MemoryStore::new();
        let user = UserId::new("u1").unwrap();
        let order = placed(&user);
        store.save_cart(&user, b"[1]".to_vec()).await.unwrap();
        store.place_order(&order, b"[1]").await.unwrap();
        let mut loaded = store.load_order(order.id()).await.unwrap().unwrap();
        assert!(loaded.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_delete_cascades_to_items() {
        let store = MemoryStore::new();
        let catalog = CatalogInput { name: "C".into(), description: None, valid_until: None }.into_catalog(CatalogId::generate());
        store.insert_catalog(&catalog).await.unwrap();
        let item = Item {
            id: ItemId::generate(), name: "bolt".into(), part_number: "B1".into(), image: None, lead_time_days: 1,
            price: Money::ZERO, description: None, supplier_id: SupplierId::generate(), catalog_id: catalog.id,
        };
        store.insert_item(&item).await.unwrap();
        assert!(store.delete_catalog(catalog.id).await.unwrap());
        assert!(store.get_item(item.id).await.unwrap().is_none());
        assert!(!store.delete_catalog(catalog.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_place_order_refuses_changed_cart() {
        let store = MemoryStore::new();
        let user = UserId::new("u1").unwrap();
        store.save_cart(&user, b"[2]".to_vec()).await.unwrap();
        let order = placed(&user);
        assert!(matches!(store.place_order(&order, b"[1]").await, Err(BackofficeError::Conflict(_))));
        assert!(store.load_order(order.id()).await.unwrap().is_none());
        assert_eq!(store.load_cart(&user).await.unwrap(), Some(b"[2]".to_vec()));
    }

    #[tokio::test]
    async fn test_delete_checks_version() {
        let store = MemoryStore::new();
        let user = UserId::new("u1").unwrap();
        let order = placed(&user);
        store.save_cart(&user, b"[1]".to_vec()).await.unwrap();
        store.place_order(&order, b"[1]").await.unwrap();
        store.save_order(&order).await.unwrap();
        assert!(matches!(store.delete_order(order.id(), 0).await, Err(BackofficeError::Conflict(_))));
        assert!(store.load_order(order.id()).await.unwrap().is_some());
        store.delete_order(order.id(), 1).await.unwrap();
        assert!(matches!(store.delete_order(order.id(), 1).await, Err(BackofficeError::NotFound(_))));
    }
}
