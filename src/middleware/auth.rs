use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{
    error::AppError,
    services::auth_service::{self, TOKEN_TYPE_ACCESS},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
        })?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header.".to_string()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme.".to_string()))?
            .trim();

        let claims = auth_service::decode_claims(token, &state.jwt_secret)?;
        if claims.token_type != TOKEN_TYPE_ACCESS {
            return Err(AppError::Unauthorized(
                "Invalid or expired token.".to_string(),
            ));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token.".to_string()))?;

        Ok(AuthUser { user_id })
    }
}
