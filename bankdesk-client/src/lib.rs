//! REST client for the banking back-office API
//!
//! Implements the list collaborator (`ListSource`) for the user-management
//! list, plus the mutation, stats, login and registration endpoints.

mod auth;
pub mod client;
pub mod response;

pub use auth::{NewRegistration, MIN_PASSWORD_LEN};
pub use client::{ApiClient, ApiSettings};
pub use response::{classify_status, error_detail};
