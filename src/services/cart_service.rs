use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{cart_items, products, Products},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<Vec<CartItem>> {
    let rows = cart_items::Entity::find()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .find_also_related(Products)
        .order_by_desc(cart_items::Column::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        let Some(product) = product else { continue };
        items.push(CartItem::from_entity(item, &product));
    }
    Ok(items)
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<CartItem> {
    let product_id = match payload.product_id {
        Some(id) => id,
        None => return Err(AppError::BadRequest("productId required.".to_string())),
    };
    let quantity = payload.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1.".to_string(),
        ));
    }

    let product = Products::find_by_id(product_id)
        .filter(products::Column::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound("Product not found.".to_string())),
    };

    let size = normalize_variant(payload.size);
    let color = normalize_variant(payload.color);

    let existing = cart_items::Entity::find()
        .filter(line_condition(user.user_id, product_id, &size, &color))
        .one(&state.orm)
        .await?;

    let item = match existing {
        // Repeat adds accumulate, they never overwrite.
        Some(item) => increment_quantity(&state.orm, item, quantity).await?,
        None => {
            let insert = cart_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                size: Set(size.clone()),
                color: Set(color.clone()),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await;

            match insert {
                Ok(item) => item,
                // Two rapid adds can race past the existence check; the
                // unique index turns the loser into an increment.
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    let item = cart_items::Entity::find()
                        .filter(line_condition(user.user_id, product_id, &size, &color))
                        .one(&state.orm)
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound("Cart item not found.".to_string())
                        })?;
                    increment_quantity(&state.orm, item, quantity).await?
                }
                Err(err) => return Err(err.into()),
            }
        }
    };

    Ok(CartItem::from_entity(item, &product))
}

/// Returns `None` when the quantity update emptied the line out of the
/// cart (quantity <= 0 deletes).
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<Option<CartItem>> {
    let quantity = match payload.quantity {
        Some(q) => q,
        None => return Err(AppError::BadRequest("quantity required.".to_string())),
    };

    // Scoping by user is the ownership check: someone else's line is a 404.
    let found = cart_items::Entity::find_by_id(item_id)
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .find_also_related(Products)
        .one(&state.orm)
        .await?;
    let (item, product) = match found {
        Some((item, Some(product))) => (item, product),
        _ => return Err(AppError::NotFound("Cart item not found.".to_string())),
    };

    if quantity <= 0 {
        cart_items::Entity::delete_by_id(item.id)
            .exec(&state.orm)
            .await?;
        return Ok(None);
    }

    let mut active: cart_items::ActiveModel = item.into();
    active.quantity = Set(quantity);
    let item = active.update(&state.orm).await?;

    Ok(Some(CartItem::from_entity(item, &product)))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<()> {
    cart_items::Entity::delete_many()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    Ok(())
}

async fn increment_quantity(
    orm: &DatabaseConnection,
    item: cart_items::Model,
    by: i32,
) -> AppResult<cart_items::Model> {
    let quantity = item.quantity + by;
    let mut active: cart_items::ActiveModel = item.into();
    active.quantity = Set(quantity);
    Ok(active.update(orm).await?)
}

/// Exact (user, product, size, color) tuple; absent variants match NULL.
fn line_condition(
    user_id: Uuid,
    product_id: Uuid,
    size: &Option<String>,
    color: &Option<String>,
) -> Condition {
    let mut condition = Condition::all()
        .add(cart_items::Column::UserId.eq(user_id))
        .add(cart_items::Column::ProductId.eq(product_id));
    condition = match size {
        Some(s) => condition.add(cart_items::Column::Size.eq(s.clone())),
        None => condition.add(cart_items::Column::Size.is_null()),
    };
    match color {
        Some(c) => condition.add(cart_items::Column::Color.eq(c.clone())),
        None => condition.add(cart_items::Column::Color.is_null()),
    }
}

fn normalize_variant(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_variants_collapse_to_none() {
        assert_eq!(normalize_variant(Some("".to_string())), None);
        assert_eq!(normalize_variant(Some("  ".to_string())), None);
        assert_eq!(
            normalize_variant(Some("XL".to_string())),
            Some("XL".to_string())
        );
        assert_eq!(normalize_variant(None), None);
    }
}
