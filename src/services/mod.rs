pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod mailer;
pub mod order_service;
pub mod otp;
