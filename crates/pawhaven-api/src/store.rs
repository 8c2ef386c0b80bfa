use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use pawhaven_db::CheckoutOutcome;
use pawhaven_db::models::{NewOrder, NewProduct, OrderRow, ProductRow};
use pawhaven_types::api::{
    Claims, CreateOrderRequest, CreateOrderResponse, ProductCreate, ProductResponse, RecentOrder,
    RecentOrderItem,
};

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};
use crate::run_blocking;
use crate::state::AppState;
use crate::users::require_admin;

const RECENT_ORDERS: u32 = 10;
const BLANK_LINK: &str = "about:blank";

fn product_response(row: ProductRow) -> ProductResponse {
    ProductResponse {
        id: convert::uuid(&row.id, "product id"),
        name: row.name,
        description: row.description,
        price: convert::cents_to_price(row.price_cents),
        stock: row.stock,
        image_url: row.image_url,
        affiliated_url: row.affiliated_url,
        is_active: row.is_active,
    }
}

fn recent_order(row: OrderRow) -> RecentOrder {
    RecentOrder {
        id: convert::uuid(&row.id, "order id"),
        buyer_name: row.buyer_name,
        date: convert::timestamp(&row.created_at, "order created_at"),
        total: convert::cents_to_price(row.total_cents),
        items: row
            .items
            .into_iter()
            .map(|item| RecentOrderItem {
                product_id: convert::uuid(&item.product_id, "order item product id"),
                name: item.product_name,
                quantity: item.quantity,
                price: convert::cents_to_price(item.unit_price_cents),
            })
            .collect(),
    }
}

/// `1250` -> `"12.50"`.
fn money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// Plain-text order summary sent to the shop over WhatsApp.
pub fn order_message(order: &OrderRow) -> String {
    let mut lines = vec!["New order from webstore:".to_string()];
    if let Some(name) = &order.buyer_name {
        lines.push(format!("Name: {name}"));
    }
    if let Some(phone) = &order.buyer_phone {
        lines.push(format!("Phone: {phone}"));
    }
    lines.push(String::new());
    for item in &order.items {
        lines.push(format!(
            "- {} x{} @ {} = {}",
            item.product_name,
            item.quantity,
            money(item.unit_price_cents),
            money(item.unit_price_cents * item.quantity)
        ));
    }
    lines.push(String::new());
    lines.push(format!("Total: {}", money(order.total_cents)));
    lines.push(format!("Order ID: {}", order.id));
    lines.join("\n")
}

/// `https://wa.me/<number>?text=<message>`, or `about:blank` without a number.
pub fn whatsapp_link(number: Option<&str>, message: &str) -> String {
    let Some(number) = number else {
        return BLANK_LINK.to_string();
    };
    match Url::parse_with_params(&format!("https://wa.me/{number}"), [("text", message)]) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!("Invalid WhatsApp number '{}': {}", number, e);
            BLANK_LINK.to_string()
        }
    }
}

pub async fn list_products(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let rows = run_blocking(&state, |db| db.list_active_products()).await?;
    Ok(Json(rows.into_iter().map(product_response).collect()))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProductResponse>> {
    let id = id.to_string();
    let row = run_blocking(&state, move |db| db.get_product(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(product_response(row)))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ProductCreate>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&state, &claims).await?;
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Product name is required"));
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err(ApiError::bad_request("Price cannot be negative"));
    }
    if req.stock < 0 {
        return Err(ApiError::bad_request("Stock cannot be negative"));
    }

    let product = NewProduct {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        description: req.description,
        price_cents: convert::price_to_cents(req.price),
        stock: req.stock,
        image_url: req.image_url,
        affiliated_url: req.affiliated_url,
        is_active: req.is_active,
    };
    let row = run_blocking(&state, move |db| db.create_product(&product)).await?;
    info!("Product {} ({}) created by {}", row.id, row.name, claims.sub);
    Ok((StatusCode::CREATED, Json(product_response(row))))
}

/// Place an order and hand back the WhatsApp link that forwards it to the
/// shop. Stock, order and items commit together or not at all.
pub async fn checkout(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.items.is_empty() {
        return Err(ApiError::bad_request("Cart is empty"));
    }
    if req.items.iter().any(|i| i.quantity < 1) {
        return Err(ApiError::bad_request("Quantity must be at least 1"));
    }

    let order = NewOrder {
        id: Uuid::new_v4().to_string(),
        buyer_name: req.buyer_name.filter(|s| !s.trim().is_empty()),
        buyer_phone: req.buyer_phone.filter(|s| !s.trim().is_empty()),
        sent_to_whatsapp: state.whatsapp_number.is_some(),
    };
    let items: Vec<(String, i64)> = req
        .items
        .iter()
        .map(|i| (i.product_id.to_string(), i.quantity))
        .collect();

    let outcome = run_blocking(&state, move |db| db.checkout(&order, &items)).await?;
    let placed = match outcome {
        CheckoutOutcome::Placed(order) => order,
        CheckoutOutcome::ProductNotFound { product_id } => {
            return Err(ApiError::not_found(format!("Product {product_id} not found")));
        }
        CheckoutOutcome::InsufficientStock {
            name,
            available,
            requested,
        } => {
            return Err(ApiError::bad_request(format!(
                "Not enough stock for {name}. Available: {available}, requested: {requested}"
            )));
        }
        CheckoutOutcome::TotalOverflow => {
            return Err(ApiError::bad_request("Order total is too large"));
        }
    };

    let whatsapp_url = whatsapp_link(state.whatsapp_number.as_deref(), &order_message(&placed));
    info!(
        "Order {} placed: {} items, total {}",
        placed.id,
        placed.items.len(),
        money(placed.total_cents)
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_id: convert::uuid(&placed.id, "order id"),
            whatsapp_url,
        }),
    ))
}

pub async fn recent_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<RecentOrder>>> {
    require_admin(&state, &claims).await?;
    let rows = run_blocking(&state, |db| db.recent_orders(RECENT_ORDERS)).await?;
    Ok(Json(rows.into_iter().map(recent_order).collect()))
}
