pub mod health;
pub mod profile;

pub use health::health_handler;
pub use profile::{identity_from_headers, issue_profile_handler, PROFILE_CONTENT_TYPE};
