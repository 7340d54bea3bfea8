//! Application services. Each one checks the caller, applies the domain
//! rules and talks to the stores through their traits.

pub mod cart;
pub mod orders;
pub mod registry;

use std::sync::Arc;
use crate::publisher::EventPublisher;
use crate::store::Store;

pub use cart::CartService;
pub use orders::{CheckoutDetails, EditOutcome, OrderEngine};
pub use registry::RegistryService;

/// Every service wired against one backend.
#[derive(Clone)]
pub struct Backoffice {
    pub registry: RegistryService,
    pub carts: CartService,
    pub orders: OrderEngine,
}

impl Backoffice {
    pub fn new<S: Store + 'static>(store: Arc<S>, events: Arc<dyn EventPublisher>) -> Self {
        let carts = CartService::new(store.clone(), store.clone());
        Self {
            registry: RegistryService::new(store.clone(), events.clone()),
            orders: OrderEngine::new(store, carts.clone(), events),
            carts,
        }
    }
}
