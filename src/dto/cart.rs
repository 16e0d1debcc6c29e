use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    #[serde(default, alias = "productId")]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    #[serde(default)]
    pub quantity: Option<i32>,
}
