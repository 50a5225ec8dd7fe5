//! Customer signup page for a headless storefront.
//!
//! Renders the registration form, validates what was submitted, and lets the
//! commerce platform create the account and issue the access token which is
//! then kept in a signed session cookie.

pub mod account;
pub mod auth;
pub mod config;
pub mod general;

use std::sync::Arc;

use axum::{extract::FromRef, routing::get, Router};
use axum_extra::extract::cookie::Key;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{account::AccountService, auth::signup, config::Config};

/// Shared state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<dyn AccountService>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(config: Config, accounts: Arc<dyn AccountService>) -> Self {
        // Length already checked while loading the config
        let cookie_key = Key::from(&config.session_secret);

        Self {
            config: Arc::new(config),
            accounts,
            cookie_key,
        }
    }
}

/// Signing key for the session cookie
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            auth::REGISTER_PATH,
            get(signup::get)
                .post(signup::post)
                .fallback(signup::method_not_allowed),
        )
        .nest_service("/assets", ServeDir::new("assets"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
