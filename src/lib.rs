//! Funnelwire - webhook ingestion and marketing fan-out service.
//!
//! Receives signed webhooks from the payment provider (Stripe) and the
//! form-intake provider (Tally), verifies their signatures, and fans the
//! resulting events out to the email-marketing provider (SendGrid) as
//! contact upserts and templated transactional sends.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
