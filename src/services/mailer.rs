use anyhow::Result;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::AppConfig;

/// SMTP notifier. Every message here is a side-channel: callers treat a
/// failed send as a warning, never as a request failure.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl Mailer {
    /// Build from config. Without SMTP settings the mailer is in log-only
    /// mode: messages are logged and dropped.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let Some(smtp) = &config.smtp else {
            return Ok(Self::disabled());
        };

        let credentials = Credentials::new(smtp.username.clone(), smtp.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
            .port(smtp.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport: Some(transport),
            from_address: smtp.from_address.clone(),
        })
    }

    /// Log-only mailer with no SMTP transport.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_address: "noreply@apparel-shop.local".to_string(),
        }
    }

    pub async fn send_otp_email(&self, to: &str, code: &str) -> Result<()> {
        self.deliver(
            to,
            "Your verification code",
            &format!("Your OTP is {code}. It is valid for 5 minutes."),
        )
        .await
    }

    pub async fn send_welcome_email(&self, to: &str, first_name: &str) -> Result<()> {
        self.deliver(
            to,
            "Welcome!",
            &format!("Hi {first_name},\n\nThank you for joining. We are excited to have you!"),
        )
        .await
    }

    pub async fn send_login_alert(&self, to: &str, first_name: &str) -> Result<()> {
        self.deliver(
            to,
            "New login to your account",
            &format!("Hi {first_name},\n\nWe noticed a new login to your account."),
        )
        .await
    }

    pub async fn send_order_confirmation(
        &self,
        to: &str,
        first_name: &str,
        order_id: Uuid,
        total: Decimal,
    ) -> Result<()> {
        self.deliver(
            to,
            &format!("Order Confirmation #{order_id}"),
            &format!(
                "Hi {first_name},\n\nYour order #{order_id} has been confirmed.\nTotal: {total}\n\nThank you for shopping with us!"
            ),
        )
        .await
    }

    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            tracing::info!(to = %to, subject = %subject, body = %body, "smtp not configured, logging instead of sending");
            return Ok(());
        };

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        tracing::info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_only_mode_never_fails() {
        let mailer = Mailer::disabled();
        mailer
            .send_otp_email("someone@example.com", "123456")
            .await
            .expect("log-only send");
        mailer
            .send_order_confirmation(
                "someone@example.com",
                "Asha",
                Uuid::new_v4(),
                Decimal::new(269700, 2),
            )
            .await
            .expect("log-only send");
    }
}
