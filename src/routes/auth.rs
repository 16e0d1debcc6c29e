use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::auth::{
        AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest,
        SendOtpRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::Detail,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-otp", post(send_otp))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/token/refresh", post(token_refresh))
}

#[utoipa::path(
    post,
    path = "/auth/send-otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP issued and mailed", body = Detail),
        (status = 400, description = "Missing email"),
    ),
    tag = "Auth"
)]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> AppResult<Json<Detail>> {
    let resp = auth_service::send_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid OTP or validation errors"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let resp = auth_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Authenticated user's profile", body = User),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn profile(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<User>> {
    let resp = auth_service::profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/auth/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token"),
    ),
    tag = "Auth"
)]
pub async fn token_refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let resp = auth_service::refresh(&state, payload).await?;
    Ok(Json(resp))
}
