//! Persistence contracts and their backends.
//!
//! Stores only move records in and out; every rule lives in the aggregates
//! and services. `PgStore` is the production backend, `MemoryStore` backs
//! development runs and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use crate::domain::aggregates::{Catalog, Item, ItemInput, Order, Supplier};
use crate::domain::value_objects::{CatalogId, ItemId, OrderId, SupplierId, UserId};
use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn list_catalogs(&self) -> Result<Vec<Catalog>>;
    async fn get_catalog(&self, id: CatalogId) -> Result<Option<Catalog>>;
    async fn insert_catalog(&self, catalog: &Catalog) -> Result<()>;
    /// `false` when the row no longer exists.
    async fn update_catalog(&self, catalog: &Catalog) -> Result<bool>;
    /// Cascades to the catalog's items.
    async fn delete_catalog(&self, id: CatalogId) -> Result<bool>;

    async fn list_suppliers(&self) -> Result<Vec<Supplier>>;
    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>>;
    async fn insert_supplier(&self, supplier: &Supplier) -> Result<()>;
    async fn update_supplier(&self, supplier: &Supplier) -> Result<bool>;
    /// Cascades to the supplier's items.
    async fn delete_supplier(&self, id: SupplierId) -> Result<bool>;

    async fn list_items(&self, catalog: Option<CatalogId>) -> Result<Vec<Item>>;
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>>;
    async fn insert_item(&self, item: &Item) -> Result<()>;
    /// Full replace, except that `input.image == None` leaves the stored image untouched.
    async fn update_item(&self, id: ItemId, input: &ItemInput) -> Result<Option<Item>>;
    async fn delete_item(&self, id: ItemId) -> Result<bool>;
}

/// Opaque per-user session payloads. The cart service owns the encoding.
#[async_trait]
pub trait CartSessionStore: Send + Sync {
    async fn load_cart(&self, user: &UserId) -> Result<Option<Vec<u8>>>;
    async fn save_cart(&self, user: &UserId, payload: Vec<u8>) -> Result<()>;
    async fn clear_cart(&self, user: &UserId) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn load_order(&self, id: OrderId) -> Result<Option<Order>>;
    /// Newest first.
    async fn orders_for_user(&self, user: &UserId) -> Result<Vec<Order>>;
    /// Newest first.
    async fn all_orders(&self) -> Result<Vec<Order>>;
    /// Inserts a new order and drops its owner's cart in one transaction.
    /// `Conflict` unless the stored cart still equals `cart_payload`, the
    /// payload the order was built from.
    async fn place_order(&self, order: &Order, cart_payload: &[u8]) -> Result<()>;
    /// Writes status, total and lines if the stored version still equals
    /// `order.version()`; returns the new version. `Conflict` otherwise.
    async fn save_order(&self, order: &Order) -> Result<i64>;
    /// Same version rule as `save_order`.
    async fn delete_order(&self, id: OrderId, expected_version: i64) -> Result<()>;
}

/// A backend able to serve every service. Checkout relies on the order and
/// cart data sharing one transactional store.
pub trait Store: RegistryStore + CartSessionStore + OrderStore {}

impl<T> Store for T where T: RegistryStore + CartSessionStore + OrderStore {}
