//! Catalog and Supplier records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::value_objects::{not_blank, CatalogId, SupplierId};

/// Named grouping of items, optionally valid only until a given moment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Catalog {
    pub id: CatalogId,
    pub name: String,
    pub description: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl Catalog {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CatalogInput {
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl CatalogInput {
    pub fn into_catalog(self, id: CatalogId) -> Catalog {
        Catalog { id, name: self.name.trim().to_string(), description: self.description, valid_until: self.valid_until }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub name: String,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

impl SupplierInput {
    pub fn into_supplier(self, id: SupplierId) -> Supplier {
        Supplier { id, name: self.name.trim().to_string(), contact_email: self.contact_email, phone: self.phone, address: self.address }
    }
}
