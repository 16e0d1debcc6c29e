use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub smtp: Option<SmtpConfig>,
}

/// SMTP settings are optional as a whole: without SMTP_HOST the mailer
/// runs in log-only mode and no delivery is attempted.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")?;
        let smtp = Self::smtp_from_env()?;
        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            smtp,
        })
    }

    fn smtp_from_env() -> anyhow::Result<Option<SmtpConfig>> {
        let host = match env::var("SMTP_HOST") {
            Ok(h) => h,
            Err(_) => return Ok(None),
        };
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(587);
        let username = env::var("SMTP_USERNAME")?;
        let password = env::var("SMTP_PASSWORD")?;
        let from_address =
            env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@apparel-shop.local".to_string());
        Ok(Some(SmtpConfig {
            host,
            port,
            username,
            password,
            from_address,
        }))
    }
}
