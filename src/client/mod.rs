//! HTTP data-access layer for the helpdesk API.
//!
//! Every call takes the bearer token explicitly and returns the decoded body
//! as the server sent it. Nothing is cached or retried.

pub mod state;

pub use state::{ErrorKind, RequestState};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::api::{ApiKeyResponse, ApiResponse};
use crate::domain::{Product, TicketId};
use crate::models::{Note, Ticket, User};
use crate::services::{AuthenticatedUser, ChangePasswordRequest, LoginRequest, RegisterRequest};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP status for errors the server answered, `None` otherwise.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidUrl(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HelpdeskClient {
    client: Client,
    base_url: Url,
}

impl HelpdeskClient {
    /// Creates a client for the server at `base_url`, e.g. `http://localhost:5000`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("helpdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        debug!(%method, %url, "Sending request");
        Ok(self.client.request(method, url))
    }

    fn authed(
        &self,
        method: Method,
        path: &str,
        token: &str,
    ) -> Result<RequestBuilder, ClientError> {
        Ok(self.request(method, path)?.bearer_auth(token))
    }

    pub async fn fetch_notes(
        &self,
        ticket_id: TicketId,
        token: &str,
    ) -> Result<Vec<Note>, ClientError> {
        let path = format!("api/tickets/{ticket_id}/notes");
        decode(self.authed(Method::GET, &path, token)?.send().await?).await
    }

    pub async fn submit_note(
        &self,
        ticket_id: TicketId,
        text: &str,
        token: &str,
    ) -> Result<Note, ClientError> {
        let path = format!("api/tickets/{ticket_id}/notes");
        let request = self
            .authed(Method::POST, &path, token)?
            .json(&json!({ "text": text }));
        decode(request.send().await?).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, ClientError> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("api/users", &body).await
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("api/users/login", &body).await
    }

    pub async fn me(&self, token: &str) -> Result<User, ClientError> {
        decode(self.authed(Method::GET, "api/users/me", token)?.send().await?).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        token: &str,
    ) -> Result<(), ClientError> {
        let body = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let request = self.authed(Method::PUT, "api/users/password", token)?.json(&body);
        let _: ApiResponse = decode(request.send().await?).await?;
        Ok(())
    }

    /// Returns the new token; `token` is revoked by this call.
    pub async fn regenerate_api_key(&self, token: &str) -> Result<String, ClientError> {
        let request = self.authed(Method::POST, "api/users/api-key/regenerate", token)?;
        let body: ApiKeyResponse = decode(request.send().await?).await?;
        Ok(body.token)
    }

    pub async fn list_tickets(&self, token: &str) -> Result<Vec<Ticket>, ClientError> {
        decode(self.authed(Method::GET, "api/tickets", token)?.send().await?).await
    }

    pub async fn get_ticket(&self, id: TicketId, token: &str) -> Result<Ticket, ClientError> {
        let path = format!("api/tickets/{id}");
        decode(self.authed(Method::GET, &path, token)?.send().await?).await
    }

    pub async fn create_ticket(
        &self,
        product: Product,
        description: &str,
        token: &str,
    ) -> Result<Ticket, ClientError> {
        let request = self
            .authed(Method::POST, "api/tickets", token)?
            .json(&json!({ "product": product, "description": description }));
        decode(request.send().await?).await
    }

    pub async fn close_ticket(&self, id: TicketId, token: &str) -> Result<Ticket, ClientError> {
        let path = format!("api/tickets/{id}");
        let request = self
            .authed(Method::PUT, &path, token)?
            .json(&json!({ "status": "closed" }));
        decode(request.send().await?).await
    }

    pub async fn delete_ticket(&self, id: TicketId, token: &str) -> Result<(), ClientError> {
        let path = format!("api/tickets/{id}");
        let _: ApiResponse = decode(self.authed(Method::DELETE, &path, token)?.send().await?).await?;
        Ok(())
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        decode(self.request(Method::POST, path)?.json(body).send().await?).await
    }
}

/// Decodes a success body, or turns the error envelope into [`ClientError::Http`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Http {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiResponse>(body)
        && let Some(message) = envelope.error
    {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}
