use sea_orm::DatabaseConnection;

use crate::services::{mailer::Mailer, otp::OtpStore};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub otp: OtpStore,
    pub mailer: Mailer,
    pub jwt_secret: String,
}
