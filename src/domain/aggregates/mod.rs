//! Aggregates module
pub mod catalog;
pub mod item;
pub mod order;
pub mod cart;

pub use catalog::{Catalog, CatalogInput, Supplier, SupplierInput};
pub use item::{Item, ItemInput};
pub use order::{CustomerDetails, LineEdit, LinesAfterEdit, Order, OrderError, OrderLine, OrderParts, OrderStatus};
pub use cart::{Cart, CartLine};
