use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::orders::CheckoutRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_orders).post(checkout))
}

#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "The user's orders, newest first", body = Vec<Order>),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = order_service::list_orders(&state, &user).await?;
    Ok(Json(orders))
}

#[utoipa::path(
    post,
    path = "/orders",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created from cart", body = Order),
        (status = 400, description = "Cart is empty"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Option<Json<CheckoutRequest>>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let order = order_service::checkout(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
