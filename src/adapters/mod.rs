//! Adapter implementations for the provider ports.

pub mod dns;
pub mod http;
pub mod sendgrid;
pub mod stripe;
pub mod tally;
