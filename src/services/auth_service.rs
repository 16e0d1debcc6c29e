use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    dto::auth::{
        AuthResponse, Claims, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest,
        SendOtpRequest,
    },
    entity::users,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::Detail,
    services::otp::generate_otp,
    state::AppState,
};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

const ACCESS_LIFETIME_HOURS: i64 = 24;
const REFRESH_LIFETIME_DAYS: i64 = 7;

pub async fn send_otp(state: &AppState, payload: SendOtpRequest) -> AppResult<Detail> {
    let email = match payload.email.filter(|e| !e.trim().is_empty()) {
        Some(e) => e,
        None => return Err(AppError::BadRequest("Email is required.".to_string())),
    };

    let code = generate_otp();
    state.otp.put(&email, &code).await;

    if let Err(err) = state.mailer.send_otp_email(&email, &code).await {
        tracing::warn!(error = %err, "otp email failed");
    }

    Ok(Detail::new("OTP sent successfully."))
}

pub async fn register(state: &AppState, payload: RegisterRequest) -> AppResult<AuthResponse> {
    let email = payload.email.clone().filter(|e| !e.trim().is_empty());
    let otp = payload.otp.clone().filter(|o| !o.trim().is_empty());
    let (email, otp) = match (email, otp) {
        (Some(email), Some(otp)) => (email, otp),
        _ => return Err(AppError::BadRequest("Email and OTP are required.".to_string())),
    };

    if !state.otp.matches(&email, &otp).await {
        return Err(AppError::BadRequest("Invalid or expired OTP.".to_string()));
    }

    let fields = validate_registration(&payload)
        .map_err(|errors| AppError::BadRequest(errors.join(" ")))?;

    let taken = users::Entity::find()
        .filter(
            Condition::any()
                .add(users::Column::Phone.eq(fields.phone.clone()))
                .add(users::Column::Email.eq(email.clone())),
        )
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest(
            "A user with that phone or email already exists.".to_string(),
        ));
    }

    let password_hash = hash_password(&fields.password)?;

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        phone: Set(fields.phone),
        email: Set(email.clone()),
        first_name: Set(fields.first_name),
        last_name: Set(fields.last_name),
        password_hash: Set(password_hash),
        dob: Set(fields.dob),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Codes are single-use: a second registration attempt has to request
    // a fresh one.
    state.otp.invalidate(&email).await;

    if let Err(err) = state
        .mailer
        .send_welcome_email(&user.email, &user.first_name)
        .await
    {
        tracing::warn!(error = %err, "welcome email failed");
    }

    let (access, refresh) = issue_token_pair(user.id, &state.jwt_secret)?;
    Ok(AuthResponse {
        access,
        refresh,
        user: User::from_entity(user),
    })
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<AuthResponse> {
    let email = payload.email.filter(|e| !e.trim().is_empty());
    let password = payload.password.filter(|p| !p.is_empty());
    let (email, password) = match (email, password) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            return Err(AppError::BadRequest(
                "Email and password required.".to_string(),
            ));
        }
    };

    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(&state.orm)
        .await?;

    // Unknown email and wrong password reject identically.
    let user = match user {
        Some(u) => u,
        None => return Err(invalid_credentials()),
    };
    if !verify_password(&password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    if let Err(err) = state
        .mailer
        .send_login_alert(&user.email, &user.first_name)
        .await
    {
        tracing::warn!(error = %err, "login alert email failed");
    }

    let (access, refresh) = issue_token_pair(user.id, &state.jwt_secret)?;
    Ok(AuthResponse {
        access,
        refresh,
        user: User::from_entity(user),
    })
}

pub async fn profile(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    let user = users::Entity::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?;
    match user {
        Some(user) => Ok(User::from_entity(user)),
        None => Err(AppError::Unauthorized("User not found.".to_string())),
    }
}

pub async fn refresh(state: &AppState, payload: RefreshRequest) -> AppResult<RefreshResponse> {
    let token = match payload.refresh.filter(|t| !t.trim().is_empty()) {
        Some(t) => t,
        None => {
            return Err(AppError::BadRequest(
                "Refresh token is required.".to_string(),
            ));
        }
    };

    let claims = decode_claims(&token, &state.jwt_secret)?;
    if claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(AppError::Unauthorized(
            "Invalid or expired token.".to_string(),
        ));
    }
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token.".to_string()))?;

    let access = issue_token(
        user_id,
        TOKEN_TYPE_ACCESS,
        Duration::hours(ACCESS_LIFETIME_HOURS),
        &state.jwt_secret,
    )?;
    Ok(RefreshResponse { access })
}

pub fn issue_token_pair(user_id: Uuid, secret: &str) -> AppResult<(String, String)> {
    let access = issue_token(
        user_id,
        TOKEN_TYPE_ACCESS,
        Duration::hours(ACCESS_LIFETIME_HOURS),
        secret,
    )?;
    let refresh = issue_token(
        user_id,
        TOKEN_TYPE_REFRESH,
        Duration::days(REFRESH_LIFETIME_DAYS),
        secret,
    )?;
    Ok((access, refresh))
}

fn issue_token(
    user_id: Uuid,
    token_type: &str,
    lifetime: Duration,
    secret: &str,
) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(lifetime)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
        token_type: token_type.to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn decode_claims(token: &str, secret: &str) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token.".to_string()))?;
    Ok(decoded.claims)
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials.".to_string())
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Debug)]
struct RegistrationFields {
    phone: String,
    first_name: String,
    last_name: Option<String>,
    password: String,
    dob: Option<NaiveDate>,
}

fn validate_registration(payload: &RegisterRequest) -> Result<RegistrationFields, Vec<String>> {
    let mut errors = Vec::new();

    let phone = payload
        .phone
        .clone()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if phone.is_none() {
        errors.push("The phone number must be set.".to_string());
    }

    let first_name = payload
        .first_name
        .clone()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if first_name.is_none() {
        errors.push("First name is required.".to_string());
    }

    let password = payload.password.clone().unwrap_or_default();
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters.".to_string());
    } else if password.chars().all(|c| c.is_ascii_digit()) {
        errors.push("Password cannot be entirely numeric.".to_string());
    }

    if payload.password2.as_deref() != Some(password.as_str()) {
        errors.push("Password fields didn't match.".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(RegistrationFields {
        phone: phone.unwrap(),
        first_name: first_name.unwrap(),
        last_name: payload.last_name.clone().filter(|n| !n.trim().is_empty()),
        password,
        dob: payload.dob,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> RegisterRequest {
        RegisterRequest {
            phone: Some("9876543210".to_string()),
            email: Some("asha@example.com".to_string()),
            first_name: Some("Asha".to_string()),
            last_name: None,
            password: Some("s3cret-pass".to_string()),
            password2: Some("s3cret-pass".to_string()),
            dob: None,
            otp: Some("123456".to_string()),
        }
    }

    #[test]
    fn valid_registration_passes() {
        let fields = validate_registration(&valid_payload()).expect("valid");
        assert_eq!(fields.phone, "9876543210");
        assert_eq!(fields.first_name, "Asha");
    }

    #[test]
    fn mismatched_passwords_are_listed() {
        let mut payload = valid_payload();
        payload.password2 = Some("different".to_string());
        let errors = validate_registration(&payload).unwrap_err();
        assert_eq!(errors, vec!["Password fields didn't match.".to_string()]);
    }

    #[test]
    fn short_and_numeric_passwords_rejected() {
        let mut payload = valid_payload();
        payload.password = Some("short".to_string());
        payload.password2 = Some("short".to_string());
        let errors = validate_registration(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("at least 8")));

        let mut payload = valid_payload();
        payload.password = Some("12345678".to_string());
        payload.password2 = Some("12345678".to_string());
        let errors = validate_registration(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("entirely numeric")));
    }

    #[test]
    fn missing_phone_collects_all_errors() {
        let mut payload = valid_payload();
        payload.phone = Some("   ".to_string());
        payload.password2 = Some("other".to_string());
        let errors = validate_registration(&payload).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn token_pair_round_trips_with_types() {
        let user_id = Uuid::new_v4();
        let (access, refresh) = issue_token_pair(user_id, "test-secret").expect("pair");

        let access_claims = decode_claims(&access, "test-secret").expect("access claims");
        assert_eq!(access_claims.token_type, TOKEN_TYPE_ACCESS);
        assert_eq!(access_claims.sub, user_id.to_string());

        let refresh_claims = decode_claims(&refresh, "test-secret").expect("refresh claims");
        assert_eq!(refresh_claims.token_type, TOKEN_TYPE_REFRESH);

        assert!(decode_claims(&access, "wrong-secret").is_err());
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("s3cret-pass").expect("hash");
        assert!(verify_password("s3cret-pass", &hash).expect("verify"));
        assert!(!verify_password("not-the-password", &hash).expect("verify"));
    }
}
