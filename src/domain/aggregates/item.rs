//! Item Aggregate

use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::value_objects::{not_blank, CatalogId, ItemId, Money, SupplierId};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub part_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
    pub lead_time_days: u32,
    pub price: Money,
    pub description: Option<String>,
    pub supplier_id: SupplierId,
    pub catalog_id: CatalogId,
}

/// Full-replace payload for create and update. `image: None` on update keeps the stored blob.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ItemInput {
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 64), custom = "not_blank")]
    pub part_number: String,
    #[serde(default)]
    pub image: Option<Vec<u8>>,
    #[validate(range(max = 3650))]
    pub lead_time_days: u32,
    pub price: Money,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub supplier_id: SupplierId,
    pub catalog_id: CatalogId,
}

impl ItemInput {
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id, name: self.name.trim().to_string(), part_number: self.part_number.trim().to_string(),
            image: self.image.filter(|bytes| !bytes.is_empty()), lead_time_days: self.lead_time_days,
            price: self.price, description: self.description, supplier_id: self.supplier_id, catalog_id: self.catalog_id,
        }
    }
}

impl Item {
    pub fn has_image(&self) -> bool { self.image.is_some() }

    /// Replaces every field from `input`; the image only when a non-empty payload is supplied.
    pub fn apply_update(&mut self, input: ItemInput) {
        let kept = self.image.take();
        let mut updated = input.into_item(self.id);
        if updated.image.is_none() { updated.image = kept; }
        *self = updated;
    }
}
