//! Domain types shared across the service.
//!
//! These types carry the business rules that do not depend on any provider:
//! email address validation, display-name splitting, and the read-only
//! product/waitlist catalogue.

pub mod catalogue;
pub mod email;
pub mod name;

pub use catalogue::{Catalogue, EmailTouchpoint, Product, Waitlist};
pub use email::{mask, normalize, Email, EmailError, RESOLUTION_ALLOWLIST};
pub use name::PersonName;
