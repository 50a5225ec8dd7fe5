use shuttle_runtime::SecretStore;
use thiserror::Error;

const DEFAULT_API_VERSION: &str = "2024-01";
const DEFAULT_LANDING_PATH: &str = "/account";
const DEFAULT_LOGIN_PATH: &str = "/account/login";

/// Minimum length accepted by the cookie signing key
pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// Error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing secret {0}")]
    Missing(&'static str),

    #[error("SESSION_SECRET must be at least {} bytes long", MIN_SESSION_SECRET_LEN)]
    SessionSecretTooShort,

    #[error("invalid boolean for {key}: {value}")]
    InvalidBool { key: &'static str, value: String },
}

/// Service configuration
/// Everything comes from the deployment secrets
#[derive(Clone)]
pub struct Config {
    pub storefront_api_url: String,
    pub storefront_access_token: String,
    pub session_secret: Vec<u8>,
    pub secure_cookies: bool,
    pub landing_path: String,
    pub login_path: String,
}

impl Config {
    /// Load the configuration from the Shuttle secret store
    pub fn from_secrets(secrets: &SecretStore) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| secrets.get(key))
    }

    /// Load the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Endpoint: explicit url wins over domain + version
        let storefront_api_url = match lookup("STOREFRONT_API_URL") {
            Some(url) => url,
            None => {
                let domain =
                    lookup("STOREFRONT_DOMAIN").ok_or(ConfigError::Missing("STOREFRONT_DOMAIN"))?;
                let version = lookup("STOREFRONT_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_owned());
                storefront_endpoint(&domain, &version)
            }
        };

        let storefront_access_token = lookup("STOREFRONT_ACCESS_TOKEN")
            .ok_or(ConfigError::Missing("STOREFRONT_ACCESS_TOKEN"))?;

        let session_secret = lookup("SESSION_SECRET")
            .ok_or(ConfigError::Missing("SESSION_SECRET"))?
            .into_bytes();
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::SessionSecretTooShort);
        }

        let secure_cookies = match lookup("SESSION_COOKIE_SECURE") {
            None => true,
            Some(value) => parse_bool("SESSION_COOKIE_SECURE", value)?,
        };

        Ok(Self {
            storefront_api_url,
            storefront_access_token,
            session_secret,
            secure_cookies,
            landing_path: lookup("ACCOUNT_LANDING_PATH")
                .unwrap_or_else(|| DEFAULT_LANDING_PATH.to_owned()),
            login_path: lookup("ACCOUNT_LOGIN_PATH")
                .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_owned()),
        })
    }
}

fn storefront_endpoint(domain: &str, version: &str) -> String {
    let domain = domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');

    format!("https://{}/api/{}/graphql.json", domain, version)
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, value }),
    }
}
