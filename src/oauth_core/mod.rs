pub mod authorization_code;
pub mod bearer;
pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod error;
pub mod issuer;
pub mod memory;
pub mod oauth_provider;
pub mod refresh_token;
pub mod replay;
pub mod request;
pub mod scope;
pub mod types;
