//! Business logic services
//!
//! This module contains service layer components that encapsulate
//! business logic, separated from HTTP concerns.

pub mod profile_service;

pub use profile_service::{ProfileService, Stage};
