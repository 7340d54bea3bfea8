//! Catalog, supplier and item administration.

use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;
use crate::access::Caller;
use crate::domain::aggregates::{Catalog, CatalogInput, Item, ItemInput, Supplier, SupplierInput};
use crate::domain::events::{DomainEvent, ItemEvent};
use crate::domain::value_objects::{CatalogId, ItemId, SupplierId};
use crate::publisher::EventPublisher;
use crate::store::RegistryStore;
use crate::{BackofficeError, Result};

#[derive(Clone)]
pub struct RegistryService {
    store: Arc<dyn RegistryStore>,
    events: Arc<dyn EventPublisher>,
}

impl RegistryService {
    pub fn new(store: Arc<dyn RegistryStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self { store, events }
    }

    // -- catalogs --

    pub async fn list_catalogs(&self, caller: &Caller) -> Result<Vec<Catalog>> {
        caller.require_admin()?;
        self.store.list_catalogs().await
    }

    pub async fn get_catalog(&self, caller: &Caller, id: CatalogId) -> Result<Catalog> {
        caller.require_admin()?;
        self.store.get_catalog(id).await?.ok_or_else(|| BackofficeError::NotFound(format!("catalog {id}")))
    }

    #[instrument(skip(self, caller, input), fields(user = ?caller.current_user()))]
    pub async fn create_catalog(&self, caller: &Caller, input: CatalogInput) -> Result<Catalog> {
        caller.require_admin()?;
        input.validate()?;
        let catalog = input.into_catalog(CatalogId::generate());
        self.store.insert_catalog(&catalog).await?;
        info!(catalog_id = %catalog.id, "catalog created");
        Ok(catalog)
    }

    #[instrument(skip(self, caller, input), fields(user = ?caller.current_user()))]
    pub async fn update_catalog(&self, caller: &Caller, id: CatalogId, input: CatalogInput) -> Result<Catalog> {
        caller.require_admin()?;
        input.validate()?;
        let catalog = input.into_catalog(id);
        if !self.store.update_catalog(&catalog).await? {
            return Err(BackofficeError::NotFound(format!("catalog {id}")));
        }
        Ok(catalog)
    }

    /// Removes the catalog and its items. Unknown ids are a no-op.
    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn delete_catalog(&self, caller: &Caller, id: CatalogId) -> Result<()> {
        caller.require_admin()?;
        if self.store.delete_catalog(id).await? { info!(catalog_id = %id, "catalog deleted"); }
        Ok(())
    }

    // -- suppliers --

    pub async fn list_suppliers(&self, caller: &Caller) -> Result<Vec<Supplier>> {
        caller.require_admin()?;
        self.store.list_suppliers().await
    }

    pub async fn get_supplier(&self, caller: &Caller, id: SupplierId) -> Result<Supplier> {
        caller.require_admin()?;
        self.store.get_supplier(id).await?.ok_or_else(|| BackofficeError::NotFound(format!("supplier {id}")))
    }

    #[instrument(skip(self, caller, input), fields(user = ?caller.current_user()))]
    pub async fn create_supplier(&self, caller: &Caller, input: SupplierInput) -> Result<Supplier> {
        caller.require_admin()?;
        input.validate()?;
        let supplier = input.into_supplier(SupplierId::generate());
        self.store.insert_supplier(&supplier).await?;
        info!(supplier_id = %supplier.id, "supplier created");
        Ok(supplier)
    }

    #[instrument(skip(self, caller, input), fields(user = ?caller.current_user()))]
    pub async fn update_supplier(&self, caller: &Caller, id: SupplierId, input: SupplierInput) -> Result<Supplier> {
        caller.require_admin()?;
        input.validate()?;
        let supplier = input.into_supplier(id);
        if !self.store.update_supplier(&supplier).await? {
            return Err(BackofficeError::NotFound(format!("supplier {id}")));
        }
        Ok(supplier)
    }

    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn delete_supplier(&self, caller: &Caller, id: SupplierId) -> Result<()> {
        caller.require_admin()?;
        if self.store.delete_supplier(id).await? { info!(supplier_id = %id, "supplier deleted"); }
        Ok(())
    }

    // -- items --

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.store.list_items(None).await
    }

    pub async fn items_in_catalog(&self, catalog: CatalogId) -> Result<Vec<Item>> {
        if self.store.get_catalog(catalog).await?.is_none() {
            return Err(BackofficeError::NotFound(format!("catalog {catalog}")));
        }
        self.store.list_items(Some(catalog)).await
    }

    pub async fn get_item(&self, id: ItemId) -> Result<Item> {
        self.store.get_item(id).await?.ok_or_else(|| BackofficeError::NotFound(format!("item {id}")))
    }

    #[instrument(skip(self, caller, input), fields(user = ?caller.current_user()))]
    pub async fn create_item(&self, caller: &Caller, input: ItemInput) -> Result<Item> {
        caller.require_admin()?;
        self.check_item_input(&input).await?;
        let item = input.into_item(ItemId::generate());
        self.store.insert_item(&item).await?;
        info!(item_id = %item.id, price = %item.price, "item created");
        self.events.publish(&DomainEvent::Item(ItemEvent::Created { item_id: item.id, price: item.price })).await;
        Ok(item)
    }

    /// Full replace. Without an image payload the stored image is kept.
    #[instrument(skip(self, caller, input), fields(user = ?caller.current_user()))]
    pub async fn update_item(&self, caller: &Caller, id: ItemId, input: ItemInput) -> Result<Item> {
        caller.require_admin()?;
        self.check_item_input(&input).await?;
        let item = self.store.update_item(id, &input).await?
            .ok_or_else(|| BackofficeError::NotFound(format!("item {id}")))?;
        self.events.publish(&DomainEvent::Item(ItemEvent::Updated { item_id: id, price: item.price })).await;
        Ok(item)
    }

    /// Existing order lines keep their name and price snapshot.
    #[instrument(skip(self, caller), fields(user = ?caller.current_user()))]
    pub async fn delete_item(&self, caller: &Caller, id: ItemId) -> Result<()> {
        caller.require_admin()?;
        if self.store.delete_item(id).await? {
            self.events.publish(&DomainEvent::Item(ItemEvent::Deleted { item_id: id })).await;
        }
        Ok(())
    }

    async fn check_item_input(&self, input: &ItemInput) -> Result<()> {
        input.validate()?;
        if self.store.get_supplier(input.supplier_id).await?.is_none() {
            return Err(BackofficeError::Validation(format!("unknown supplier {}", input.supplier_id)));
        }
        if self.store.get_catalog(input.catalog_id).await?.is_none() {
            return Err(BackofficeError::Validation(format!("unknown catalog {}", input.catalog_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Money, UserId};
    use crate::publisher::testing::RecordingPublisher;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    fn admin() -> Caller { Caller::admin(UserId::new("root").unwrap()) }
    fn user() -> Caller { Caller::user(UserId::new("alice").unwrap()) }

    fn catalog_input(name: &str) -> CatalogInput {
        CatalogInput { name: name.into(), description: None, valid_until: None }
    }

    fn supplier_input(name: &str) -> SupplierInput {
        SupplierInput { name: name.into(), contact_email: Some("sales@acme.test".into()), phone: None, address: None }
    }

    fn item_input(supplier_id: SupplierId, catalog_id: CatalogId, image: Option<Vec<u8>>) -> ItemInput {
        ItemInput {
            name: "Hex bolt".into(), part_number: "HB-8".into(), image, lead_time_days: 3,
            price: Money::new(Decimal::new(250, 2)).unwrap(), description: None, supplier_id, catalog_id,
        }
    }

    async fn setup() -> (RegistryService, Arc<RecordingPublisher>, SupplierId, CatalogId) {
        let events = Arc::new(RecordingPublisher::default());
        let registry = RegistryService::new(Arc::new(MemoryStore::new()), events.clone());
        let supplier = registry.create_supplier(&admin(), supplier_input("Acme")).await.unwrap();
        let catalog = registry.create_catalog(&admin(), catalog_input("Fasteners")).await.unwrap();
        (registry, events, supplier.id, catalog.id)
    }

    #[tokio::test]
    async fn test_writes_require_admin() {
        let (registry, _, supplier, catalog) = setup().await;
        assert!(matches!(registry.create_catalog(&user(), catalog_input("X")).await, Err(BackofficeError::Forbidden)));
        assert!(matches!(registry.list_suppliers(&Caller::anonymous()).await, Err(BackofficeError::Unauthenticated)));
        assert!(matches!(
            registry.create_item(&user(), item_input(supplier, catalog, None)).await,
            Err(BackofficeError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_create_validates() {
        let (registry, _, _, _) = setup().await;
        assert!(matches!(registry.create_catalog(&admin(), catalog_input("   ")).await, Err(BackofficeError::Validation(_))));
        let mut bad = supplier_input("Acme");
        bad.contact_email = Some("not-an-email".into());
        assert!(matches!(registry.create_supplier(&admin(), bad).await, Err(BackofficeError::Validation(_))));
    }

    #[tokio::test]
    async fn test_item_requires_known_references() {
        let (registry, _, supplier, catalog) = setup().await;
        let err = registry.create_item(&admin(), item_input(SupplierId::generate(), catalog, None)).await.unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(_)));
        let err = registry.create_item(&admin(), item_input(supplier, CatalogId::generate(), None)).await.unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_image_when_absent() {
        let (registry, events, supplier, catalog) = setup().await;
        let item = registry.create_item(&admin(), item_input(supplier, catalog, Some(vec![1, 2, 3]))).await.unwrap();
        let mut input = item_input(supplier, catalog, None);
        input.name = "Hex bolt M8".into();
        let updated = registry.update_item(&admin(), item.id, input).await.unwrap();
        assert_eq!(updated.name, "Hex bolt M8");
        assert_eq!(updated.image, Some(vec![1, 2, 3]));

        let replaced = registry.update_item(&admin(), item.id, item_input(supplier, catalog, Some(vec![9]))).await.unwrap();
        assert_eq!(replaced.image, Some(vec![9]));
        assert_eq!(events.subjects(), vec!["item.created", "item.updated", "item.updated"]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (registry, _, supplier, catalog) = setup().await;
        let err = registry.update_item(&admin(), ItemId::generate(), item_input(supplier, catalog, None)).await.unwrap_err();
        assert!(matches!(err, BackofficeError::NotFound(_)));
        let err = registry.update_catalog(&admin(), CatalogId::generate(), catalog_input("C")).await.unwrap_err();
        assert!(matches!(err, BackofficeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_item_reads_are_public() {
        let (registry, _, supplier, catalog) = setup().await;
        let item = registry.create_item(&admin(), item_input(supplier, catalog, None)).await.unwrap();
        assert_eq!(registry.get_item(item.id).await.unwrap().part_number, "HB-8");
        assert_eq!(registry.items_in_catalog(catalog).await.unwrap().len(), 1);
        assert!(matches!(registry.items_in_catalog(CatalogId::generate()).await, Err(BackofficeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_supplier_cascades_and_is_idempotent() {
        let (registry, events, supplier, catalog) = setup().await;
        let item = registry.create_item(&admin(), item_input(supplier, catalog, None)).await.unwrap();
        registry.delete_supplier(&admin(), supplier).await.unwrap();
        registry.delete_supplier(&admin(), supplier).await.unwrap();
        assert!(matches!(registry.get_item(item.id).await, Err(BackofficeError::NotFound(_))));
        registry.delete_item(&admin(), item.id).await.unwrap();
        assert_eq!(events.subjects(), vec!["item.created"]);
    }
}
