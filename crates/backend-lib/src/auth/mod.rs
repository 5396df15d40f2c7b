// ============================
// authd-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod codec;
pub mod notifier;
pub mod password;
pub mod token_generator;
mod service;
mod service_impl;

pub use codec::{Claims, MintedPair, MintedToken, TokenCodec, TokenError};
pub use notifier::{EmailNotification, LogNotifier, NoopNotifier, Notifier};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
