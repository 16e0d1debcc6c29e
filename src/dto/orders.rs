use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub shipping_address: Option<String>,
}
