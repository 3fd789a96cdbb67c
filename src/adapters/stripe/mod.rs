//! Stripe adapter: webhook signature verification and the Checkout API
//! client.

mod client;
mod signature;

pub use client::{StripeClient, StripeConfig};
