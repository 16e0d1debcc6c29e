use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::CheckoutRequest,
    entity::{cart_items, order_items, orders, products, users, Products},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, ProductBrief},
    state::AppState,
};

const DEFAULT_SHIPPING_ADDRESS: &str = "Default Address";

/// One cart line joined to the product fields the order needs.
#[derive(Debug, FromQueryResult)]
struct CartLineRow {
    product_id: Uuid,
    quantity: i32,
    size: Option<String>,
    color: Option<String>,
    price: Decimal,
    name: String,
    images: serde_json::Value,
    collection: String,
}

/// Converts the cart into an order. Reading the cart, writing the order
/// and its lines, and emptying the cart commit together or not at all;
/// only the confirmation email sits outside the transaction.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;

    let rows = cart_items::Entity::find()
        .select_only()
        .column_as(cart_items::Column::ProductId, "product_id")
        .column_as(cart_items::Column::Quantity, "quantity")
        .column_as(cart_items::Column::Size, "size")
        .column_as(cart_items::Column::Color, "color")
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .column_as(products::Column::Price, "price")
        .column_as(products::Column::Name, "name")
        .column_as(products::Column::Images, "images")
        .column_as(products::Column::Collection, "collection")
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .into_model::<CartLineRow>()
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty.".to_string()));
    }

    let total_amount = order_total(&rows);

    let shipping_address = payload
        .shipping_address
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SHIPPING_ADDRESS.to_string());

    // Settlement is stubbed: cash on delivery, auto-confirmed.
    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set("confirmed".to_string()),
        payment_status: Set("completed".to_string()),
        payment_method: Set("COD".to_string()),
        shipping_address: Set(shipping_address),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        // The line price is copied from the product now; later price
        // edits must not reach into historical orders.
        let item = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            quantity: Set(row.quantity),
            price: Set(row.price),
            size: Set(row.size.clone()),
            color: Set(row.color.clone()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        items.push(OrderItem {
            id: item.id,
            product: ProductBrief {
                id: row.product_id,
                name: row.name.clone(),
                price: row.price,
                images: serde_json::from_value(row.images.clone()).unwrap_or_default(),
                collection: row.collection.clone(),
            },
            quantity: item.quantity,
            price: item.price,
            size: item.size,
            color: item.color,
        });
    }

    cart_items::Entity::delete_many()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    notify_order_confirmed(state, user.user_id, order.id, order.total_amount).await;

    Ok(Order::from_entity(order, items))
}

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<Vec<Order>> {
    let orders = orders::Entity::find()
        .filter(orders::Column::UserId.eq(user.user_id))
        .order_by_desc(orders::Column::CreatedAt)
        .all(&state.orm)
        .await?;

    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let item_rows = order_items::Entity::find()
        .filter(order_items::Column::OrderId.is_in(order_ids))
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for (item, product) in item_rows {
        let Some(product) = product else { continue };
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItem::from_entity(item, &product));
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            Order::from_entity(order, items)
        })
        .collect())
}

fn order_total(rows: &[CartLineRow]) -> Decimal {
    rows.iter()
        .map(|row| row.price * Decimal::from(row.quantity))
        .sum()
}

/// Best-effort side-channel; a failure here never unwinds the order.
async fn notify_order_confirmed(state: &AppState, user_id: Uuid, order_id: Uuid, total: Decimal) {
    let user = match users::Entity::find_by_id(user_id).one(&state.orm).await {
        Ok(Some(user)) => user,
        Ok(None) => return,
        Err(err) => {
            tracing::warn!(error = %err, "order confirmation lookup failed");
            return;
        }
    };

    if let Err(err) = state
        .mailer
        .send_order_confirmation(&user.email, &user.first_name, order_id, total)
        .await
    {
        tracing::warn!(error = %err, "order confirmation email failed");
    }
}
