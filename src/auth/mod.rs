//! Authentication for the Twitter v1.1 API.
//!
//! All endpoints this tool uses require an OAuth 1.0a user context.

pub mod credentials;
pub mod oauth1;
