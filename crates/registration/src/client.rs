//! HTTP client for the Synapse registration-token admin API.

use {
    async_trait::async_trait,
    chrono::{Duration, Utc},
    reqwest::{Client, Response, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde_json::json,
    tracing::debug,
};

use crate::{
    error::RegistrationError,
    types::{Token, TokenListResponse},
};

/// Default admin API endpoint path.
pub const DEFAULT_ENDPOINT: &str = "/_synapse/admin/v1/registration_tokens";

/// Newly created tokens are valid for one registration, for this long.
const TOKEN_VALIDITY_DAYS: i64 = 7;
const TOKEN_USES_ALLOWED: i64 = 1;

/// The token operations the dispatcher needs. Implemented by
/// [`RegistrationClient`] and by in-memory fakes in tests.
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn list_tokens(&self) -> Result<Vec<Token>, RegistrationError>;
    async fn create_token(&self) -> Result<Token, RegistrationError>;
    async fn get_token(&self, token: &str) -> Result<Token, RegistrationError>;
    async fn delete_token(&self, token: &str) -> Result<Token, RegistrationError>;
    async fn delete_all_tokens(&self) -> Result<Vec<Token>, RegistrationError>;
}

/// Bearer-authenticated client for a single Synapse admin endpoint.
#[derive(Clone)]
pub struct RegistrationClient {
    http: Client,
    collection_url: String,
    token: Secret<String>,
}

impl std::fmt::Debug for RegistrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationClient")
            .field("collection_url", &self.collection_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl RegistrationClient {
    pub fn new(base_url: &str, endpoint: &str, token: Secret<String>) -> Self {
        Self {
            http: Client::new(),
            collection_url: format!("{}{endpoint}", base_url.trim_end_matches('/')),
            token,
        }
    }

    fn item_url(&self, token: &str) -> String {
        format!("{}/{token}", self.collection_url)
    }

    fn bearer(&self) -> &str {
        self.token.expose_secret()
    }

    /// Map a collection-level response: any non-2xx is a service error.
    async fn check_service(resp: Response) -> Result<Response, RegistrationError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(RegistrationError::Service { status, body })
    }

    /// Map a per-token response: 404 and 400 carry their own meanings.
    async fn check_item(resp: Response, token: &str) -> Result<Response, RegistrationError> {
        match resp.status() {
            StatusCode::NOT_FOUND => Err(RegistrationError::NotFound {
                token: token.to_owned(),
            }),
            StatusCode::BAD_REQUEST => Err(RegistrationError::InvalidToken {
                token: token.to_owned(),
            }),
            status if status.is_success() => Ok(resp),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(RegistrationError::Service { status, body })
            },
        }
    }
}

#[async_trait]
impl TokenService for RegistrationClient {
    async fn list_tokens(&self) -> Result<Vec<Token>, RegistrationError> {
        let resp = self
            .http
            .get(&self.collection_url)
            .bearer_auth(self.bearer())
            .send()
            .await?;
        let resp = Self::check_service(resp).await?;
        let list: TokenListResponse = resp.json().await?;
        debug!(count = list.registration_tokens.len(), "listed tokens");
        Ok(list.registration_tokens)
    }

    async fn create_token(&self) -> Result<Token, RegistrationError> {
        let expiry_time = (Utc::now() + Duration::days(TOKEN_VALIDITY_DAYS)).timestamp_millis();
        let resp = self
            .http
            .post(format!("{}/new", self.collection_url))
            .bearer_auth(self.bearer())
            .json(&json!({
                "expiry_time": expiry_time,
                "uses_allowed": TOKEN_USES_ALLOWED,
            }))
            .send()
            .await?;
        let resp = Self::check_service(resp).await?;
        let token: Token = resp.json().await?;
        debug!(token = %token.token, "created token");
        Ok(token)
    }

    async fn get_token(&self, token: &str) -> Result<Token, RegistrationError> {
        let resp = self
            .http
            .get(self.item_url(token))
            .bearer_auth(self.bearer())
            .send()
            .await?;
        let resp = Self::check_item(resp, token).await?;
        Ok(resp.json().await?)
    }

    async fn delete_token(&self, token: &str) -> Result<Token, RegistrationError> {
        // Fetch first so the reply can show the deleted token's last
        // known state, and so unknown/malformed ids fail before the
        // DELETE goes out.
        let state = self.get_token(token).await?;
        let resp = self
            .http
            .delete(self.item_url(token))
            .bearer_auth(self.bearer())
            .send()
            .await?;
        Self::check_item(resp, token).await?;
        debug!(token = %token, "deleted token");
        Ok(state)
    }

    async fn delete_all_tokens(&self) -> Result<Vec<Token>, RegistrationError> {
        let tokens = self.list_tokens().await?;
        for token in &tokens {
            let resp = self
                .http
                .delete(self.item_url(&token.token))
                .bearer_auth(self.bearer())
                .send()
                .await?;
            Self::check_item(resp, &token.token).await?;
        }
        debug!(count = tokens.len(), "deleted all tokens");
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use {mockito::Matcher, serde_json::json};

    use super::*;

    fn client(server: &mockito::Server) -> RegistrationClient {
        RegistrationClient::new(
            &server.url(),
            DEFAULT_ENDPOINT,
            Secret::new("admin-secret".into()),
        )
    }

    fn token_body(token: &str) -> serde_json::Value {
        json!({
            "token": token,
            "uses_allowed": 1,
            "pending": 0,
            "completed": 0,
            "expiry_time": 1_700_000_000_000_i64,
        })
    }

    #[tokio::test]
    async fn list_sends_bearer_and_parses_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", DEFAULT_ENDPOINT)
            .match_header("authorization", "Bearer admin-secret")
            .with_body(json!({ "registration_tokens": [token_body("aaa"), token_body("bbb")] }).to_string())
            .create_async()
            .await;

        let tokens = client(&server).list_tokens().await.unwrap();
        mock.assert_async().await;
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token, "aaa");
    }

    #[tokio::test]
    async fn list_maps_non_2xx_to_service_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DEFAULT_ENDPOINT)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client(&server).list_tokens().await.unwrap_err();
        assert!(matches!(err, RegistrationError::Service { status, .. }
            if status == StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn create_requests_one_use_seven_day_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", format!("{DEFAULT_ENDPOINT}/new").as_str())
            .match_body(Matcher::PartialJson(json!({ "uses_allowed": 1 })))
            .with_body(token_body("fresh").to_string())
            .create_async()
            .await;

        let token = client(&server).create_token().await.unwrap();
        mock.assert_async().await;
        assert_eq!(token.token, "fresh");
    }

    #[tokio::test]
    async fn get_maps_404_and_400() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{DEFAULT_ENDPOINT}/missing").as_str())
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", format!("{DEFAULT_ENDPOINT}/bad%20id").as_str())
            .with_status(400)
            .create_async()
            .await;

        let client = client(&server);
        assert!(matches!(
            client.get_token("missing").await.unwrap_err(),
            RegistrationError::NotFound { token } if token == "missing"
        ));
        assert!(matches!(
            client.get_token("bad id").await.unwrap_err(),
            RegistrationError::InvalidToken { token } if token == "bad id"
        ));
    }

    #[tokio::test]
    async fn delete_returns_last_known_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{DEFAULT_ENDPOINT}/gone").as_str())
            .with_body(token_body("gone").to_string())
            .create_async()
            .await;
        let del = server
            .mock("DELETE", format!("{DEFAULT_ENDPOINT}/gone").as_str())
            .with_body("{}")
            .create_async()
            .await;

        let token = client(&server).delete_token("gone").await.unwrap();
        del.assert_async().await;
        assert_eq!(token.token, "gone");
        assert_eq!(token.uses_allowed, Some(1));
    }

    #[tokio::test]
    async fn delete_all_with_no_tokens_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DEFAULT_ENDPOINT)
            .with_body(json!({ "registration_tokens": [] }).to_string())
            .create_async()
            .await;

        let deleted = client(&server).delete_all_tokens().await.unwrap();
        assert!(deleted.is_empty());
    }

    #[tokio::test]
    async fn delete_all_removes_each_listed_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", DEFAULT_ENDPOINT)
            .with_body(json!({ "registration_tokens": [token_body("x"), token_body("y")] }).to_string())
            .create_async()
            .await;
        let dx = server
            .mock("DELETE", format!("{DEFAULT_ENDPOINT}/x").as_str())
            .with_body("{}")
            .create_async()
            .await;
        let dy = server
            .mock("DELETE", format!("{DEFAULT_ENDPOINT}/y").as_str())
            .with_body("{}")
            .create_async()
            .await;

        let deleted = client(&server).delete_all_tokens().await.unwrap();
        dx.assert_async().await;
        dy.assert_async().await;
        assert_eq!(deleted.len(), 2);
    }
}
