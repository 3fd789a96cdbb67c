//! Application layer: webhook handling use cases.

pub mod handlers;
