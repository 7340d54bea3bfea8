use axum::extract::State;
use axum::http::StatusCode;
use crate::api::extract::{Json, Path};
use serde::Deserialize;
use crate::access::Caller;
use crate::domain::aggregates::{LineEdit, Order};
use crate::domain::value_objects::{OrderId, OrderLineId, Quantity};
use crate::services::{Backoffice, CheckoutDetails, EditOutcome};
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct StatusRequest { pub status: String }

#[derive(Debug, Deserialize)]
pub struct EditLinesRequest { pub edits: Vec<LineEdit> }

#[derive(Debug, Deserialize)]
pub struct LineQuantityRequest { pub quantity: i64 }

pub async fn checkout(State(app): State<Backoffice>, caller: Caller, Json(details): Json<CheckoutDetails>) -> Result<(StatusCode, Json<Order>)> {
    Ok((StatusCode::CREATED, Json(app.orders.checkout(&caller, details).await?)))
}

pub async fn my_orders(State(app): State<Backoffice>, caller: Caller) -> Result<Json<Vec<Order>>> {
    Ok(Json(app.orders.my_orders(&caller).await?))
}

pub async fn all_orders(State(app): State<Backoffice>, caller: Caller) -> Result<Json<Vec<Order>>> {
    Ok(Json(app.orders.all_orders(&caller).await?))
}

pub async fn get_order(State(app): State<Backoffice>, caller: Caller, Path(id): Path<OrderId>) -> Result<Json<Order>> {
    Ok(Json(app.orders.details(&caller, id).await?))
}

pub async fn cancel_order(State(app): State<Backoffice>, caller: Caller, Path(id): Path<OrderId>) -> Result<Json<Order>> {
    Ok(Json(app.orders.cancel(&caller, id).await?))
}

pub async fn update_status(
    State(app): State<Backoffice>,
    caller: Caller,
    Path(id): Path<OrderId>,
    Json(r): Json<StatusRequest>,
) -> Result<Json<Order>> {
    Ok(Json(app.orders.update_status(&caller, id, &r.status).await?))
}

pub async fn edit_lines(
    State(app): State<Backoffice>,
    caller: Caller,
    Path(id): Path<OrderId>,
    Json(r): Json<EditLinesRequest>,
) -> Result<Json<EditOutcome>> {
    Ok(Json(app.orders.edit_lines(&caller, id, &r.edits).await?))
}

pub async fn update_line_quantity(
    State(app): State<Backoffice>,
    caller: Caller,
    Path((id, line_id)): Path<(OrderId, OrderLineId)>,
    Json(r): Json<LineQuantityRequest>,
) -> Result<Json<Order>> {
    let quantity = Quantity::new(r.quantity)?;
    Ok(Json(app.orders.update_line_quantity(&caller, id, line_id, quantity).await?))
}

pub async fn remove_line(
    State(app): State<Backoffice>,
    caller: Caller,
    Path((id, line_id)): Path<(OrderId, OrderLineId)>,
) -> Result<Json<EditOutcome>> {
    Ok(Json(app.orders.remove_line(&caller, id, line_id).await?))
}
