use axum::extract::State;
use axum::http::StatusCode;
use crate::api::extract::{Json, Path};
use serde::{Deserialize, Serialize};
use crate::access::Caller;
use crate::domain::aggregates::{Cart, CartLine};
use crate::domain::value_objects::{ItemId, Money};
use crate::services::Backoffice;
use crate::Result;

#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub line_count: usize,
    pub total: Money,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total = cart.total();
        Self { lines: cart.lines().to_vec(), line_count: cart.line_count(), total }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub item_id: ItemId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 { 1 }

#[derive(Debug, Deserialize)]
pub struct QuantityRequest { pub quantity: i64 }

pub async fn get_cart(State(app): State<Backoffice>, caller: Caller) -> Result<Json<CartView>> {
    Ok(Json(app.carts.get_cart(&caller).await?.into()))
}

pub async fn add_to_cart(State(app): State<Backoffice>, caller: Caller, Json(r): Json<AddToCartRequest>) -> Result<Json<CartView>> {
    Ok(Json(app.carts.add_item(&caller, r.item_id, r.quantity).await?.into()))
}

pub async fn update_cart_quantity(
    State(app): State<Backoffice>,
    caller: Caller,
    Path(item_id): Path<ItemId>,
    Json(r): Json<QuantityRequest>,
) -> Result<Json<CartView>> {
    Ok(Json(app.carts.set_quantity(&caller, item_id, r.quantity).await?.into()))
}

pub async fn remove_from_cart(State(app): State<Backoffice>, caller: Caller, Path(item_id): Path<ItemId>) -> Result<Json<CartView>> {
    Ok(Json(app.carts.remove_item(&caller, item_id).await?.into()))
}

pub async fn clear_cart(State(app): State<Backoffice>, caller: Caller) -> Result<StatusCode> {
    app.carts.clear(&caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
