use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest,
            SendOtpRequest,
        },
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::CheckoutRequest,
    },
    models::{CartItem, Order, OrderItem, Product, ProductBrief, User},
    response::{Detail, Paginated},
    routes::{auth, cart, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::send_otp,
        auth::register,
        auth::login,
        auth::profile,
        auth::token_refresh,
        products::list_products,
        products::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
    ),
    components(
        schemas(
            User,
            Product,
            ProductBrief,
            CartItem,
            Order,
            OrderItem,
            Detail,
            Paginated<Product>,
            SendOtpRequest,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            RefreshRequest,
            RefreshResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            CheckoutRequest,
            params::Pagination,
            params::ProductQuery,
            health::HealthData,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, OTP and token endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order history endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
