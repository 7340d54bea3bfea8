use axum::extract::State;
use axum::http::StatusCode;
use crate::api::extract::{Json, Path};
use crate::access::Caller;
use crate::domain::aggregates::{Catalog, CatalogInput, Item, ItemInput, Supplier, SupplierInput};
use crate::domain::value_objects::{CatalogId, ItemId, SupplierId};
use crate::services::Backoffice;
use crate::Result;

pub async fn list_catalogs(State(app): State<Backoffice>, caller: Caller) -> Result<Json<Vec<Catalog>>> {
    Ok(Json(app.registry.list_catalogs(&caller).await?))
}

pub async fn get_catalog(State(app): State<Backoffice>, caller: Caller, Path(id): Path<CatalogId>) -> Result<Json<Catalog>> {
    Ok(Json(app.registry.get_catalog(&caller, id).await?))
}

pub async fn create_catalog(State(app): State<Backoffice>, caller: Caller, Json(input): Json<CatalogInput>) -> Result<(StatusCode, Json<Catalog>)> {
    Ok((StatusCode::CREATED, Json(app.registry.create_catalog(&caller, input).await?)))
}

pub async fn update_catalog(
    State(app): State<Backoffice>,
    caller: Caller,
    Path(id): Path<CatalogId>,
    Json(input): Json<CatalogInput>,
) -> Result<Json<Catalog>> {
    Ok(Json(app.registry.update_catalog(&caller, id, input).await?))
}

pub async fn delete_catalog(State(app): State<Backoffice>, caller: Caller, Path(id): Path<CatalogId>) -> Result<StatusCode> {
    app.registry.delete_catalog(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn catalog_items(State(app): State<Backoffice>, Path(id): Path<CatalogId>) -> Result<Json<Vec<Item>>> {
    Ok(Json(app.registry.items_in_catalog(id).await?))
}

pub async fn list_suppliers(State(app): State<Backoffice>, caller: Caller) -> Result<Json<Vec<Supplier>>> {
    Ok(Json(app.registry.list_suppliers(&caller).await?))
}

pub async fn get_supplier(State(app): State<Backoffice>, caller: Caller, Path(id): Path<SupplierId>) -> Result<Json<Supplier>> {
    Ok(Json(app.registry.get_supplier(&caller, id).await?))
}

pub async fn create_supplier(State(app): State<Backoffice>, caller: Caller, Json(input): Json<SupplierInput>) -> Result<(StatusCode, Json<Supplier>)> {
    Ok((StatusCode::CREATED, Json(app.registry.create_supplier(&caller, input).await?)))
}

pub async fn update_supplier(
    State(app): State<Backoffice>,
    caller: Caller,
    Path(id): Path<SupplierId>,
    Json(input): Json<SupplierInput>,
) -> Result<Json<Supplier>> {
    Ok(Json(app.registry.update_supplier(&caller, id, input).await?))
}

pub async fn delete_supplier(State(app): State<Backoffice>, caller: Caller, Path(id): Path<SupplierId>) -> Result<StatusCode> {
    app.registry.delete_supplier(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_items(State(app): State<Backoffice>) -> Result<Json<Vec<Item>>> {
    Ok(Json(app.registry.list_items().await?))
}

pub async fn get_item(State(app): State<Backoffice>, Path(id): Path<ItemId>) -> Result<Json<Item>> {
    Ok(Json(app.registry.get_item(id).await?))
}

pub async fn create_item(State(app): State<Backoffice>, caller: Caller, Json(input): Json<ItemInput>) -> Result<(StatusCode, Json<Item>)> {
    Ok((StatusCode::CREATED, Json(app.registry.create_item(&caller, input).await?)))
}

pub async fn update_item(
    State(app): State<Backoffice>,
    caller: Caller,
    Path(id): Path<ItemId>,
    Json(input): Json<ItemInput>,
) -> Result<Json<Item>> {
    Ok(Json(app.registry.update_item(&caller, id, input).await?))
}

pub async fn delete_item(State(app): State<Backoffice>, caller: Caller, Path(id): Path<ItemId>) -> Result<StatusCode> {
    app.registry.delete_item(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
