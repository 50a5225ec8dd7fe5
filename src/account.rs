//! Customer accounts, owned by the commerce platform.
//!
//! Only two operations are needed to register someone: creating the customer
//! and exchanging the same credentials for an access token.

pub mod storefront;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use storefront::StorefrontClient;

/// Transport level failures while talking to the account service
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("request to the account service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("account service answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("account service returned GraphQL errors")]
    GraphQl(Vec<Value>),

    #[error("account service response has no {0}")]
    MissingData(&'static str),
}

/// Customer as returned right after creation
/// Fields other than the id are passed through untouched
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerUserError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreatePayload {
    #[serde(default)]
    pub customer: Option<NewCustomer>,
    #[serde(default)]
    pub user_errors: Vec<CustomerUserError>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenCreatePayload {
    #[serde(default)]
    pub customer_access_token: Option<CustomerAccessToken>,
    #[serde(default)]
    pub user_errors: Vec<CustomerUserError>,
}

/// External account service
/// Account storage, password hashing and token issuance all live behind it
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn create_customer(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerCreatePayload, AccountError>;

    async fn create_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccessTokenCreatePayload, AccountError>;
}
