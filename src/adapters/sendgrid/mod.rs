//! SendGrid adapter: marketing contacts and transactional mail.

mod client;

pub use client::{SendGridClient, SendGridConfig};
