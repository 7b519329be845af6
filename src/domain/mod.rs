//! Domain layer
//!
//! Pure domain types with no HTTP or backend dependencies.

pub mod identity;

pub use identity::Identity;
