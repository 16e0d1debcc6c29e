use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{cart_items, order_items, orders, products, users};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: String,
    pub dob: Option<NaiveDate>,
}

impl User {
    pub fn from_entity(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            dob: model.dob,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub collection: String,
    pub design_theme: Option<String>,
    pub fabric: Option<String>,
    pub gsm: Option<i32>,
    pub printing_type: Option<String>,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(model: products::Model) -> Self {
        Self {
            id: model.id,
            slug: product_slug(model.id, &model.name),
            name: model.name,
            price: model.price,
            description: model.description,
            images: string_list(&model.images),
            sizes: string_list(&model.sizes),
            colors: string_list(&model.colors),
            collection: model.collection,
            design_theme: model.design_theme,
            fabric: model.fabric,
            gsm: model.gsm,
            printing_type: model.printing_type,
            stock_quantity: model.stock_quantity,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Denormalized product snapshot nested inside cart and order lines.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductBrief {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub collection: String,
}

impl ProductBrief {
    pub fn from_entity(model: &products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            price: model.price,
            images: string_list(&model.images),
            collection: model.collection.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product: ProductBrief,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub total_price: Decimal,
}

impl CartItem {
    pub fn from_entity(item: cart_items::Model, product: &products::Model) -> Self {
        Self {
            id: item.id,
            total_price: product.price * Decimal::from(item.quantity),
            product: ProductBrief::from_entity(product),
            quantity: item.quantity,
            size: item.size,
            color: item.color,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub shipping_address: String,
    pub payment_method: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn from_entity(model: orders::Model, items: Vec<OrderItem>) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            total_amount: model.total_amount,
            status: model.status,
            shipping_address: model.shipping_address,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            created_at: model.created_at.with_timezone(&Utc),
            items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub product: ProductBrief,
    pub quantity: i32,
    pub price: Decimal,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl OrderItem {
    pub fn from_entity(item: order_items::Model, product: &products::Model) -> Self {
        Self {
            id: item.id,
            product: ProductBrief::from_entity(product),
            quantity: item.quantity,
            price: item.price,
            size: item.size,
            color: item.color,
        }
    }
}

fn product_slug(id: Uuid, name: &str) -> String {
    format!("{}-{}", id, name.to_lowercase().replace(' ', "-"))
}

fn string_list(value: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_id_plus_kebab_name() {
        let id = Uuid::nil();
        let slug = product_slug(id, "Midnight Bloom Tee");
        assert_eq!(
            slug,
            "00000000-0000-0000-0000-000000000000-midnight-bloom-tee"
        );
    }

    #[test]
    fn string_list_tolerates_non_list_json() {
        assert_eq!(
            string_list(&serde_json::json!(["S", "M"])),
            vec!["S".to_string(), "M".to_string()]
        );
        assert!(string_list(&serde_json::json!({"bad": "shape"})).is_empty());
    }
}
