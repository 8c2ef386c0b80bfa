use crate::models::{NewOrder, NewProduct, OrderItemRow, OrderRow, ProductRow};
use crate::{Database, OptionalExt, now};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};
use std::collections::HashMap;
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, stock, image_url, \
     affiliated_url, is_active, created_at";

/// Result of a checkout attempt. Only `Placed` writes anything.
#[derive(Debug)]
pub enum CheckoutOutcome {
    Placed(OrderRow),
    ProductNotFound {
        product_id: String,
    },
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },
    /// The order total does not fit in cents.
    TotalOverflow,
}

impl Database {
    pub fn create_product(&self, product: &NewProduct) -> Result<ProductRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (id, name, description, price_cents, stock, image_url,
                    affiliated_url, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    product.id,
                    product.name,
                    product.description,
                    product.price_cents,
                    product.stock,
                    product.image_url,
                    product.affiliated_url,
                    product.is_active,
                    now(),
                ],
            )?;
            query_product(conn, &product.id)?
                .ok_or_else(|| anyhow!("product {} vanished after insert", product.id))
        })
    }

    pub fn list_active_products(&self) -> Result<Vec<ProductRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_product)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_product(&self, id: &str) -> Result<Option<ProductRow>> {
        self.with_conn(|conn| query_product(conn, id))
    }

    /// Place an order for `items` (product id, quantity). Every line is
    /// checked against active products and current stock before anything is
    /// written; the stock decrement, order and items then commit together.
    pub fn checkout(&self, order: &NewOrder, items: &[(String, i64)]) -> Result<CheckoutOutcome> {
        self.with_tx(|conn| {
            let mut products: HashMap<&str, ProductRow> = HashMap::new();
            let mut requested: HashMap<&str, i64> = HashMap::new();

            for (product_id, quantity) in items {
                if !products.contains_key(product_id.as_str()) {
                    match query_product(conn, product_id)? {
                        Some(p) if p.is_active => {
                            products.insert(product_id.as_str(), p);
                        }
                        _ => {
                            return Ok(CheckoutOutcome::ProductNotFound {
                                product_id: product_id.clone(),
                            });
                        }
                    }
                }
                // Saturating: an absurd total still fails the stock check below.
                let total = requested.entry(product_id.as_str()).or_default();
                *total = total.saturating_add(*quantity);
            }

            for (product_id, _) in items {
                let product = &products[product_id.as_str()];
                let total_requested = requested[product_id.as_str()];
                if total_requested > product.stock {
                    return Ok(CheckoutOutcome::InsufficientStock {
                        name: product.name.clone(),
                        available: product.stock,
                        requested: total_requested,
                    });
                }
            }

            let total_cents = items.iter().try_fold(0i64, |acc, (id, q)| {
                products[id.as_str()]
                    .price_cents
                    .checked_mul(*q)
                    .and_then(|line| acc.checked_add(line))
            });
            let Some(total_cents) = total_cents else {
                return Ok(CheckoutOutcome::TotalOverflow);
            };

            let created_at = now();
            conn.execute(
                "INSERT INTO orders (id, buyer_name, buyer_phone, total_cents, sent_to_whatsapp,
                    created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    order.id,
                    order.buyer_name,
                    order.buyer_phone,
                    total_cents,
                    order.sent_to_whatsapp,
                    created_at,
                ],
            )?;

            let mut lines = Vec::with_capacity(items.len());
            for (product_id, quantity) in items {
                let product = &products[product_id.as_str()];
                conn.execute(
                    "UPDATE products SET stock = stock - ?1 WHERE id = ?2",
                    params![quantity, product_id],
                )?;
                let line = OrderItemRow {
                    id: Uuid::new_v4().to_string(),
                    order_id: order.id.clone(),
                    product_id: product_id.clone(),
                    product_name: product.name.clone(),
                    quantity: *quantity,
                    unit_price_cents: product.price_cents,
                };
                conn.execute(
                    "INSERT INTO order_items (id, order_id, product_id, product_name, quantity,
                        unit_price_cents)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        line.id,
                        line.order_id,
                        line.product_id,
                        line.product_name,
                        line.quantity,
                        line.unit_price_cents,
                    ],
                )?;
                lines.push(line);
            }

            Ok(CheckoutOutcome::Placed(OrderRow {
                id: order.id.clone(),
                buyer_name: order.buyer_name.clone(),
                buyer_phone: order.buyer_phone.clone(),
                total_cents,
                sent_to_whatsapp: order.sent_to_whatsapp,
                created_at,
                items: lines,
            }))
        })
    }

    /// The most recent `limit` orders, newest first, each with its items.
    pub fn recent_orders(&self, limit: u32) -> Result<Vec<OrderRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, buyer_name, buyer_phone, total_cents, sent_to_whatsapp, created_at
                 FROM orders ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )?;
            let mut orders = stmt
                .query_map([limit], |row| {
                    Ok(OrderRow {
                        id: row.get(0)?,
                        buyer_name: row.get(1)?,
                        buyer_phone: row.get(2)?,
                        total_cents: row.get(3)?,
                        sent_to_whatsapp: row.get(4)?,
                        created_at: row.get(5)?,
                        items: Vec::new(),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            if orders.is_empty() {
                return Ok(orders);
            }

            let placeholders: Vec<String> = (1..=orders.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, order_id, product_id, product_name, quantity, unit_price_cents
                 FROM order_items WHERE order_id IN ({}) ORDER BY rowid ASC",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let ids: Vec<&dyn rusqlite::types::ToSql> = orders
                .iter()
                .map(|o| &o.id as &dyn rusqlite::types::ToSql)
                .collect();
            let items = stmt
                .query_map(ids.as_slice(), |row| {
                    Ok(OrderItemRow {
                        id: row.get(0)?,
                        order_id: row.get(1)?,
                        product_id: row.get(2)?,
                        product_name: row.get(3)?,
                        quantity: row.get(4)?,
                        unit_price_cents: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut by_order: HashMap<String, Vec<OrderItemRow>> = HashMap::new();
            for item in items {
                by_order.entry(item.order_id.clone()).or_default().push(item);
            }
            for order in &mut orders {
                order.items = by_order.remove(&order.id).unwrap_or_default();
            }
            Ok(orders)
        })
    }
}

fn query_product(conn: &Connection, id: &str) -> Result<Option<ProductRow>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    conn.query_row(&sql, [id], map_product).optional()
}

fn map_product(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price_cents: row.get(3)?,
        stock: row.get(4)?,
        image_url: row.get(5)?,
        affiliated_url: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}
