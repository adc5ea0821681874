use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
    contacts::{
        dto::{CreateContactRequest, MessageResponse, UpdateContactRequest},
        Contact,
    },
    error::FieldError,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{msg}")]
    Api { status: u16, msg: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.msg
            .or_else(|| self.errors.and_then(|e| e.into_iter().next()).map(|e| e.msg))
    }
}

/// Thin wrapper over the HTTP API. Clones share the bearer token, so logging
/// in through one handle authorizes every other.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let req = match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let msg = resp
            .json::<ErrorBody>()
            .await
            .unwrap_or_default()
            .message()
            .unwrap_or_else(|| status.to_string());
        debug!(status = status.as_u16(), %msg, "api error");
        Err(ClientError::Api {
            status: status.as_u16(),
            msg,
        })
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.http.post(self.url("/users")).json(body)).await
    }

    pub async fn login(&self, body: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.http.post(self.url("/auth")).json(body)).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, ClientError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.send(self.http.post(self.url("/auth/refresh")).json(&body))
            .await
    }

    pub async fn load_user(&self) -> Result<PublicUser, ClientError> {
        self.send(self.http.get(self.url("/auth"))).await
    }

    pub async fn get_contacts(&self) -> Result<Vec<Contact>, ClientError> {
        self.send(self.http.get(self.url("/contacts"))).await
    }

    pub async fn add_contact(&self, body: &CreateContactRequest) -> Result<Contact, ClientError> {
        self.send(self.http.post(self.url("/contacts")).json(body))
            .await
    }

    pub async fn update_contact(
        &self,
        id: Uuid,
        body: &UpdateContactRequest,
    ) -> Result<Contact, ClientError> {
        self.send(self.http.put(self.url(&format!("/contacts/{id}"))).json(body))
            .await
    }

    pub async fn delete_contact(&self, id: Uuid) -> Result<MessageResponse, ClientError> {
        self.send(self.http.delete(self.url(&format!("/contacts/{id}"))))
            .await
    }
}
