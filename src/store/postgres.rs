//! PostgreSQL backend (sqlx). Schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::{Catalog, CustomerDetails, Item, ItemInput, Order, OrderLine, OrderParts, OrderStatus, Supplier};
use crate::domain::value_objects::{CatalogId, ItemId, Money, OrderId, Quantity, SupplierId, UserId};
use crate::store::{CartSessionStore, OrderStore, RegistryStore};
use crate::{BackofficeError, Result};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn lines_for(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderLine>>> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            "SELECT id, order_id, item_id, item_name, quantity, unit_price FROM order_lines WHERE order_id = ANY($1) ORDER BY order_id, position",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;
        let mut grouped: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped.entry(order_id).or_default().push(row.try_into()?);
        }
        Ok(grouped)
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.lines_for(&ids).await?;
        rows.into_iter().map(|row| {
            let order_lines = lines.remove(&row.id).unwrap_or_default();
            row.into_order(order_lines)
        }).collect()
    }
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> BackofficeError {
    BackofficeError::Storage(format!("corrupt {what} row: {detail}"))
}

fn money(value: Decimal, what: &str) -> Result<Money> { Money::new(value).map_err(|e| corrupt(what, e)) }

const ORDER_COLUMNS: &str =
    "id, user_id, placed_at, status, customer_name, contact_phone, shipping_address, total_price, version";
const ITEM_COLUMNS: &str =
    "id, name, part_number, image, lead_time_days, price, description, supplier_id, catalog_id";

#[derive(sqlx::FromRow)]
struct CatalogRow { id: Uuid, name: String, description: Option<String>, valid_until: Option<DateTime<Utc>> }

impl From<CatalogRow> for Catalog {
    fn from(r: CatalogRow) -> Self {
        Catalog { id: r.id.into(), name: r.name, description: r.description, valid_until: r.valid_until }
    }
}

#[derive(sqlx::FromRow)]
struct SupplierRow { id: Uuid, name: String, contact_email: Option<String>, phone: Option<String>, address: Option<String> }

impl From<SupplierRow> for Supplier {
    fn from(r: SupplierRow) -> Self {
        Supplier { id: r.id.into(), name: r.name, contact_email: r.contact_email, phone: r.phone, address: r.address }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid, name: String, part_number: String, image: Option<Vec<u8>>, lead_time_days: i32,
    price: Decimal, description: Option<String>, supplier_id: Uuid, catalog_id: Uuid,
}

impl TryFrom<ItemRow> for Item {
    type Error = BackofficeError;
    fn try_from(r: ItemRow) -> Result<Self> {
        Ok(Item {
            id: r.id.into(), name: r.name, part_number: r.part_number, image: r.image,
            lead_time_days: u32::try_from(r.lead_time_days).map_err(|e| corrupt("item", e))?,
            price: money(r.price, "item")?, description: r.description,
            supplier_id: r.supplier_id.into(), catalog_id: r.catalog_id.into(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, user_id: String, placed_at: DateTime<Utc>, status: String, customer_name: String,
    contact_phone: String, shipping_address: String, total_price: Decimal, version: i64,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order> {
        Ok(Order::from_parts(OrderParts {
            id: self.id.into(),
            user_id: UserId::new(self.user_id).ok_or_else(|| corrupt("order", "blank user id"))?,
            placed_at: self.placed_at,
            status: OrderStatus::parse(&self.status).map_err(|e| corrupt("order", e))?,
            customer: CustomerDetails { name: self.customer_name, phone: self.contact_phone, shipping_address: self.shipping_address },
            total: money(self.total_price, "order")?,
            lines,
            version: self.version,
        }))
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow { id: Uuid, order_id: Uuid, item_id: Uuid, item_name: String, quantity: i32, unit_price: Decimal }

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = BackofficeError;
    fn try_from(r: OrderLineRow) -> Result<Self> {
        Ok(OrderLine {
            id: r.id.into(), item_id: r.item_id.into(), item_name: r.item_name,
            quantity: Quantity::new(i64::from(r.quantity)).map_err(|e| corrupt("order line", e))?,
            unit_price: money(r.unit_price, "order line")?,
        })
    }
}

fn db_quantity(q: Quantity) -> Result<i32> {
    i32::try_from(q.value()).map_err(|_| BackofficeError::Validation(format!("quantity {q} is too large")))
}

fn db_lead_time(days: u32) -> Result<i32> {
    i32::try_from(days).map_err(|_| BackofficeError::Validation(format!("lead time {days} is too large")))
}

#[async_trait]
impl RegistryStore for PgStore {
    async fn list_catalogs(&self) -> Result<Vec<Catalog>> {
        let rows = sqlx::query_as::<_, CatalogRow>("SELECT id, name, description, valid_until FROM catalogs ORDER BY name")
            .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Catalog::from).collect())
    }

    async fn get_catalog(&self, id: CatalogId) -> Result<Option<Catalog>> {
        let row = sqlx::query_as::<_, CatalogRow>("SELECT id, name, description, valid_until FROM catalogs WHERE id = $1")
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        Ok(row.map(Catalog::from))
    }

    async fn insert_catalog(&self, c: &Catalog) -> Result<()> {
        sqlx::query("INSERT INTO catalogs (id, name, description, valid_until) VALUES ($1, $2, $3, $4)")
            .bind(c.id.as_uuid()).bind(&c.name).bind(&c.description).bind(c.valid_until)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_catalog(&self, c: &Catalog) -> Result<bool> {
        let done = sqlx::query("UPDATE catalogs SET name = $2, description = $3, valid_until = $4 WHERE id = $1")
            .bind(c.id.as_uuid()).bind(&c.name).bind(&c.description).bind(c.valid_until)
            .execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }

    async fn delete_catalog(&self, id: CatalogId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM catalogs WHERE id = $1").bind(id.as_uuid()).execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, SupplierRow>("SELECT id, name, contact_email, phone, address FROM suppliers ORDER BY name")
            .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Supplier::from).collect())
    }

    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>("SELECT id, name, contact_email, phone, address FROM suppliers WHERE id = $1")
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        Ok(row.map(Supplier::from))
    }

    async fn insert_supplier(&self, s: &Supplier) -> Result<()> {
        sqlx::query("INSERT INTO suppliers (id, name, contact_email, phone, address) VALUES ($1, $2, $3, $4, $5)")
            .bind(s.id.as_uuid()).bind(&s.name).bind(&s.contact_email).bind(&s.phone).bind(&s.address)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_supplier(&self, s: &Supplier) -> Result<bool> {
        let done = sqlx::query("UPDATE suppliers SET name = $2, contact_email = $3, phone = $4, address = $5 WHERE id = $1")
            .bind(s.id.as_uuid()).bind(&s.name).bind(&s.contact_email).bind(&s.phone).bind(&s.address)
            .execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }

    async fn delete_supplier(&self, id: SupplierId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM suppliers WHERE id = $1").bind(id.as_uuid()).execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }

    async fn list_items(&self, catalog: Option<CatalogId>) -> Result<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE ($1::uuid IS NULL OR catalog_id = $1) ORDER BY name");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(catalog.map(|c| c.as_uuid())).fetch_all(&self.pool).await?;
        rows.into_iter().map(Item::try_from).collect()
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        let row = sqlx::query_as::<_, ItemRow>(&sql).bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        row.map(Item::try_from).transpose()
    }

    async fn insert_item(&self, i: &Item) -> Result<()> {
        sqlx::query(&format!("INSERT INTO items ({ITEM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"))
            .bind(i.id.as_uuid()).bind(&i.name).bind(&i.part_number).bind(&i.image)
            .bind(db_lead_time(i.lead_time_days)?).bind(i.price.amount()).bind(&i.description)
            .bind(i.supplier_id.as_uuid()).bind(i.catalog_id.as_uuid())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_item(&self, id: ItemId, input: &ItemInput) -> Result<Option<Item>> {
        let image = input.image.as_ref().filter(|bytes| !bytes.is_empty());
        let sql = format!(
            "UPDATE items SET name = $2, part_number = $3, image = COALESCE($4, image), lead_time_days = $5, price = $6, \
             description = $7, supplier_id = $8, catalog_id = $9 WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id.as_uuid()).bind(input.name.trim()).bind(input.part_number.trim()).bind(image)
            .bind(db_lead_time(input.lead_time_days)?).bind(input.price.amount()).bind(&input.description)
            .bind(input.supplier_id.as_uuid()).bind(input.catalog_id.as_uuid())
            .fetch_optional(&self.pool).await?;
        row.map(Item::try_from).transpose()
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM items WHERE id = $1").bind(id.as_uuid()).execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }
}

#[async_trait]
impl CartSessionStore for PgStore {
    async fn load_cart(&self, user: &UserId) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT payload FROM cart_sessions WHERE user_id = $1")
            .bind(user.as_str()).fetch_optional(&self.pool).await?;
        Ok(row.map(|(payload,)| payload))
    }

    async fn save_cart(&self, user: &UserId, payload: Vec<u8>) -> Result<()> {
        sqlx::query(
            "INSERT INTO cart_sessions (user_id, payload, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET payload = EXCLUDED.payload, updated_at = NOW()",
        )
        .bind(user.as_str()).bind(payload).execute(&self.pool).await?;
        Ok(())
    }

    async fn clear_cart(&self, user: &UserId) -> Result<()> {
        sqlx::query("DELETE FROM cart_sessions WHERE user_id = $1").bind(user.as_str()).execute(&self.pool).await?;
        Ok(())
    }
}

async fn insert_lines(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
    for (position, line) in order.lines().iter().enumerate() {
        let position = i32::try_from(position).map_err(|_| BackofficeError::Validation("too many order lines".into()))?;
        sqlx::query(
            "INSERT INTO order_lines (id, order_id, position, item_id, item_name, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(line.id.as_uuid()).bind(order.id().as_uuid()).bind(position).bind(line.item_id.as_uuid())
        .bind(&line.item_name).bind(db_quantity(line.quantity)?).bind(line.unit_price.amount())
        .execute(&mut **tx).await?;
    }
    Ok(())
}

fn cart_changed(order: &Order) -> BackofficeError {
    BackofficeError::Conflict(format!("cart of {} changed during checkout", order.user_id()))
}

/// Explains a versioned write that matched no row.
async fn stale_or_missing(tx: &mut Transaction<'_, Postgres>, id: OrderId) -> BackofficeError {
    let exists: std::result::Result<(bool,), sqlx::Error> = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
        .bind(id.as_uuid()).fetch_one(&mut **tx).await;
    match exists {
        Ok((true,)) => BackofficeError::Conflict(format!("order {id} was modified concurrently")),
        Ok((false,)) => BackofficeError::NotFound(format!("order {id}")),
        Err(e) => e.into(),
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn load_order(&self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let Some(row) = sqlx::query_as::<_, OrderRow>(&sql).bind(id.as_uuid()).fetch_optional(&self.pool).await? else {
            return Ok(None);
        };
        Ok(self.assemble(vec![row]).await?.pop())
    }

    async fn orders_for_user(&self, user: &UserId) -> Result<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY placed_at DESC, id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql).bind(user.as_str()).fetch_all(&self.pool).await?;
        self.assemble(rows).await
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY placed_at DESC, id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql).fetch_all(&self.pool).await?;
        self.assemble(rows).await
    }

    async fn place_order(&self, order: &Order, cart_payload: &[u8]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let cleared = sqlx::query("DELETE FROM cart_sessions WHERE user_id = $1 AND payload = $2")
            .bind(order.user_id().as_str()).bind(cart_payload).execute(&mut *tx).await?;
        if cleared.rows_affected() != 1 {
            return Err(cart_changed(order));
        }
        sqlx::query(&format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"))
            .bind(order.id().as_uuid()).bind(order.user_id().as_str()).bind(order.placed_at())
            .bind(order.status().as_str()).bind(&order.customer().name).bind(&order.customer().phone)
            .bind(&order.customer().shipping_address).bind(order.total().amount()).bind(order.version())
            .execute(&mut *tx).await?;
        insert_lines(&mut tx, order).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_order(&self, order: &Order) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let bumped: Option<(i64,)> = sqlx::query_as(
            "UPDATE orders SET status = $2, total_price = $3, version = version + 1 WHERE id = $1 AND version = $4 RETURNING version",
        )
        .bind(order.id().as_uuid()).bind(order.status().as_str()).bind(order.total().amount()).bind(order.version())
        .fetch_optional(&mut *tx).await?;
        let Some((version,)) = bumped else {
            return Err(stale_or_missing(&mut tx, order.id()).await);
        };
        // Lines are only ever re-quantified or removed after checkout.
        let kept: Vec<Uuid> = order.lines().iter().map(|l| l.id.as_uuid()).collect();
        sqlx::query("DELETE FROM order_lines WHERE order_id = $1 AND NOT (id = ANY($2))")
            .bind(order.id().as_uuid()).bind(&kept).execute(&mut *tx).await?;
        for line in order.lines() {
            sqlx::query("UPDATE order_lines SET quantity = $3 WHERE id = $1 AND order_id = $2")
                .bind(line.id.as_uuid()).bind(order.id().as_uuid()).bind(db_quantity(line.quantity)?)
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(version)
    }

    async fn delete_order(&self, id: OrderId, expected_version: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let done = sqlx::query("DELETE FROM orders WHERE id = $1 AND version = $2")
            .bind(id.as_uuid()).bind(expected_version).execute(&mut *tx).await?;
        if done.rows_affected() != 1 {
            return Err(stale_or_missing(&mut tx, id).await);
        }
        tx.commit().await?;
        Ok(())
    }
}
