// ============================
// authd-backend-lib/src/lib.rs
// ============================
//! Core functionality for the `authd` credential service: password hashing,
//! token minting/verification, and the sign-up / sign-in / refresh / verify /
//! logout protocols over a transactional store.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod router;
pub mod store;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth, LogNotifier, NoopNotifier, Notifier};
use crate::config::Settings;
use crate::error::AppError;
use crate::store::Store;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Settings, read once at startup
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state over `store`
    pub fn new(store: Arc<dyn Store>, settings: Settings) -> Result<Self, AppError> {
        let notifier: Arc<dyn Notifier> = if settings.notifications.enabled {
            Arc::new(LogNotifier)
        } else {
            Arc::new(NoopNotifier)
        };
        let auth = DefaultAuth::from_settings(&settings, store)?.with_notifier(notifier);
        Ok(Self::with_auth(Arc::new(auth), settings))
    }

    /// Create a state around an existing service
    pub fn with_auth(auth: Arc<dyn AuthService>, settings: Settings) -> Self {
        Self {
            auth,
            settings: Arc::new(settings),
        }
    }
}
