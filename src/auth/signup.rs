use askama_axum::{IntoResponse, Template};
use axum::{
    extract::{rejection::FormRejection, State},
    http::{HeaderMap, StatusCode},
    response::{Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use http::header::{ACCEPT, LOCATION};
use serde::Deserialize;
use serde_json::json;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::{
    account::{AccountService, NewCustomer},
    config::Config,
    general::{message::MessageBlock, SignupError},
    AppState,
};

use super::{session::Session, ACCESS_TOKEN_KEY, REGISTER_PATH};

/// Template
/// HTML page definition with dynamic data
#[derive(Template)]
#[template(path = "auth/signup_page.html")]
pub struct SignupPage {
    email: String,
    action: &'static str,
    login_path: String,
    message: MessageBlock,
}

impl SignupPage {
    /// Generate page from data
    pub fn from(config: &Config, email: Option<String>, message: MessageBlock) -> Self {
        SignupPage {
            email: email.unwrap_or("".to_owned()),
            action: REGISTER_PATH,
            login_path: config.login_path.clone(),
            message,
        }
    }
}

/// Signup form
/// Data expected from the signup form
/// Passwords stay optional so an omitted field differs from an empty one
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    pub password: Option<String>,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: Option<String>,
}

/// Credentials which passed local validation
#[derive(Debug, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl SignupForm {
    /// Local checks, done before any call to the account service
    pub fn validate(self) -> Result<Credentials, SignupError> {
        // Check if password matches confirmation
        let password = match (self.password, self.password_confirm) {
            (Some(password), Some(confirm)) if password == confirm => password,
            _ => return Err(SignupError::PasswordsDoNotMatch),
        };

        // Check if missing data
        if self.email.is_empty() || password.is_empty() {
            return Err(SignupError::MissingCredentials);
        }

        Ok(Credentials {
            email: self.email,
            password,
        })
    }
}

/// Register a customer
/// Create the account, then log in with the same credentials
/// The session is only touched once both calls succeeded
pub async fn register(
    accounts: &dyn AccountService,
    session: &mut Session,
    form: SignupForm,
) -> Result<NewCustomer, SignupError> {
    let credentials = form.validate()?;

    // Create the customer
    let created = accounts
        .create_customer(&credentials.email, &credentials.password)
        .await?;

    if let Some(user_error) = created.user_errors.into_iter().next() {
        return Err(SignupError::Rejected(user_error.message));
    }

    let customer = created
        .customer
        .filter(|customer| customer.id.is_some())
        .ok_or(SignupError::CustomerNotCreated)?;

    // Get an access token for the new customer
    let issued = accounts
        .create_access_token(&credentials.email, &credentials.password)
        .await?;

    if !issued.user_errors.is_empty() {
        warn!(
            "Access token refused for new customer -> {:?}",
            issued.user_errors
        );
    }

    let token = issued
        .customer_access_token
        .filter(|token| !token.access_token.is_empty())
        .ok_or(SignupError::MissingAccessToken)?;

    // Store the token
    if let Some(expires_at) = token
        .expires_at
        .as_deref()
        .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
    {
        session.expire_at(expires_at);
    }
    session.set(ACCESS_TOKEN_KEY, token.access_token);

    Ok(customer)
}

/// Get handler
/// Redirect when already signed in, otherwise returns the signup page
pub async fn get(State(state): State<AppState>, cookies: SignedCookieJar) -> Response {
    let session = Session::load(cookies);

    // Check if already connected
    if session.get(ACCESS_TOKEN_KEY).is_some() {
        debug!("Already signed in, skipping signup");
        return Redirect::to(&state.config.landing_path).into_response();
    }

    SignupPage::from(&state.config, None, MessageBlock::empty()).into_response()
}

/// Post handler
/// Process the signup form, create the customer and its session, then redirect
/// If errors stay on the page (or answer JSON) with the error
pub async fn post(
    State(state): State<AppState>,
    headers: HeaderMap,
    cookies: SignedCookieJar,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Response {
    let wants_json = accepts_json(&headers);

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let error = SignupError::InvalidForm(rejection.body_text());
            return error_response(&state.config, error, None, wants_json);
        }
    };

    let email = form.email.clone();
    let mut session = Session::load(cookies);

    match register(state.accounts.as_ref(), &mut session, form).await {
        Ok(new_customer) => {
            info!("New customer registered");

            (
                StatusCode::FOUND,
                session.commit(state.config.secure_cookies),
                [(LOCATION, state.config.landing_path.clone())],
                Json(json!({ "error": null, "newCustomer": new_customer })),
            )
                .into_response()
        }
        Err(error) => {
            warn!("Signup failed -> {}", error);
            error_response(&state.config, error, Some(email), wants_json)
        }
    }
}

/// Fallback for any other method on the signup route
pub async fn method_not_allowed() -> Response {
    SignupError::MethodNotAllowed.into_response()
}

/// Error boundary
/// JSON clients get `{"error": ...}`, browsers get the page with the message inline
fn error_response(
    config: &Config,
    error: SignupError,
    email: Option<String>,
    wants_json: bool,
) -> Response {
    if wants_json {
        return error.into_response();
    }

    let status = error.status();
    let page = SignupPage::from(config, email, MessageBlock::error(&error.to_string()));

    (status, page).into_response()
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}
