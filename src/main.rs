use std::sync::Arc;

use shuttle_runtime::SecretStore;
use storefront_signup::{account::StorefrontClient, config::Config, router, AppState};
use tracing::info;

#[shuttle_runtime::main]
async fn main(#[shuttle_runtime::Secrets] secrets: SecretStore) -> shuttle_axum::ShuttleAxum {
    let config = Config::from_secrets(&secrets)
        .map_err(|error| shuttle_runtime::Error::Custom(error.into()))?;

    let accounts = StorefrontClient::new(
        config.storefront_api_url.clone(),
        config.storefront_access_token.clone(),
    )
    .map_err(|error| shuttle_runtime::Error::Custom(error.into()))?;

    info!("Storefront API at {}", config.storefront_api_url);

    let state = AppState::new(config, Arc::new(accounts));

    Ok(router(state).into())
}

