use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartItem,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart))
        .route("/{id}", patch(update_cart_item))
        .route("/clear", delete(clear_cart))
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Cart lines for the current user", body = Vec<CartItem>),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<CartItem>>> {
    let items = cart_service::list_cart(&state, &user).await?;
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Line created or merged", body = CartItem),
        (status = 400, description = "Missing productId"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<(StatusCode, Json<CartItem>)> {
    let item = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    patch,
    path = "/cart/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart line ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Updated line", body = CartItem),
        (status = 204, description = "Line deleted (quantity <= 0)"),
        (status = 400, description = "Missing quantity"),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Response> {
    match cart_service::update_quantity(&state, &user, id, payload).await? {
        Some(item) => Ok(Json(item).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/cart/clear",
    responses(
        (status = 204, description = "Cart emptied"),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    cart_service::clear_cart(&state, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
