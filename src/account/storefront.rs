use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::{AccessTokenCreatePayload, AccountError, AccountService, CustomerCreatePayload};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

const CUSTOMER_CREATE_MUTATION: &str = r#"
mutation customerCreate($input: CustomerCreateInput!) {
  customerCreate(input: $input) {
    customer {
      id
      email
      firstName
      lastName
      acceptsMarketing
    }
    userErrors: customerUserErrors {
      code
      field
      message
    }
  }
}
"#;

const ACCESS_TOKEN_CREATE_MUTATION: &str = r#"
mutation customerAccessTokenCreate($input: CustomerAccessTokenCreateInput!) {
  customerAccessTokenCreate(input: $input) {
    customerAccessToken {
      accessToken
      expiresAt
    }
    userErrors: customerUserErrors {
      code
      field
      message
    }
  }
}
"#;

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerCreateData {
    customer_create: Option<CustomerCreatePayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenCreateData {
    customer_access_token_create: Option<AccessTokenCreatePayload>,
}

/// Storefront GraphQL API client
#[derive(Clone)]
pub struct StorefrontClient {
    client: Client,
    endpoint: String,
    access_token: String,
}

impl StorefrontClient {
    pub fn new(
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, AccountError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        })
    }

    /// Send one mutation and unwrap the GraphQL envelope
    async fn mutate<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, AccountError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Storefront API refused the mutation");
            return Err(AccountError::Status { status, body });
        }

        let envelope: GraphQlResponse<T> = response.json().await?;

        if !envelope.errors.is_empty() {
            warn!(count = envelope.errors.len(), "Storefront API returned errors");
            return Err(AccountError::GraphQl(envelope.errors));
        }

        envelope.data.ok_or(AccountError::MissingData("data"))
    }
}

#[async_trait]
impl AccountService for StorefrontClient {
    #[instrument(skip(self, password))]
    async fn create_customer(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerCreatePayload, AccountError> {
        let data: CustomerCreateData = self
            .mutate(
                CUSTOMER_CREATE_MUTATION,
                json!({ "input": { "email": email, "password": password } }),
            )
            .await?;

        debug!("customerCreate answered");

        data.customer_create
            .ok_or(AccountError::MissingData("customerCreate"))
    }

    #[instrument(skip(self, password))]
    async fn create_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccessTokenCreatePayload, AccountError> {
        let data: AccessTokenCreateData = self
            .mutate(
                ACCESS_TOKEN_CREATE_MUTATION,
                json!({ "input": { "email": email, "password": password } }),
            )
            .await?;

        debug!("customerAccessTokenCreate answered");

        data.customer_access_token_create
            .ok_or(AccountError::MissingData("customerAccessTokenCreate"))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(mock_server: &MockServer) -> StorefrontClient {
        StorefrontClient::new(format!("{}/graphql.json", mock_server.uri()), "public-token")
            .unwrap()
    }

    #[tokio::test]
    async fn create_customer_sends_credentials_and_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql.json"))
            .and(header(ACCESS_TOKEN_HEADER, "public-token"))
            .and(body_partial_json(json!({
                "variables": { "input": { "email": "jane@example.com", "password": "hunter22" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "customerCreate": {
                        "customer": { "id": "gid://shopify/Customer/7", "email": "jane@example.com" },
                        "userErrors": []
                    }
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let payload = client_for(&mock_server)
            .create_customer("jane@example.com", "hunter22")
            .await
            .unwrap();

        let customer = payload.customer.unwrap();
        assert_eq!(customer.id.as_deref(), Some("gid://shopify/Customer/7"));
        assert!(payload.user_errors.is_empty());
    }

    #[tokio::test]
    async fn create_customer_returns_user_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "customerCreate": {
                        "customer": null,
                        "userErrors": [{
                            "code": "TAKEN",
                            "field": ["input", "email"],
                            "message": "Email has already been taken"
                        }]
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let payload = client_for(&mock_server)
            .create_customer("jane@example.com", "hunter22")
            .await
            .unwrap();

        assert!(payload.customer.is_none());
        assert_eq!(payload.user_errors[0].code.as_deref(), Some("TAKEN"));
        assert_eq!(payload.user_errors[0].message, "Email has already been taken");
    }

    #[tokio::test]
    async fn create_access_token_parses_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "customerAccessTokenCreate": {
                        "customerAccessToken": {
                            "accessToken": "abc123",
                            "expiresAt": "2030-01-01T00:00:00Z"
                        },
                        "userErrors": []
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let payload = client_for(&mock_server)
            .create_access_token("jane@example.com", "hunter22")
            .await
            .unwrap();

        let token = payload.customer_access_token.unwrap();
        assert_eq!(token.access_token, "abc123");
        assert_eq!(token.expires_at.as_deref(), Some("2030-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn graphql_errors_are_surfaced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "Throttled" }]
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .create_customer("jane@example.com", "hunter22")
            .await;

        match result {
            Err(AccountError::GraphQl(errors)) => assert_eq!(errors[0]["message"], "Throttled"),
            other => panic!("expected GraphQL errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_failure_is_a_status_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .create_access_token("jane@example.com", "hunter22")
            .await;

        match result {
            Err(AccountError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_payload_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "customerCreate": null } })),
            )
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .create_customer("jane@example.com", "hunter22")
            .await;

        assert!(matches!(
            result,
            Err(AccountError::MissingData("customerCreate"))
        ));
    }
}
