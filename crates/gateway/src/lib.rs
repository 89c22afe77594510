//! Login gateway: the network call behind the authentication gate.

use std::time::Duration;

use adminshell_core::SessionUser;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};

mod worker;

pub use worker::{LoginOutcome, LoginWorker};

/// Identifies one login attempt. Issued by the caller; outcomes carry it
/// back so superseded attempts can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoginTicket(pub u64);

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("登录失败")]
    Rejected { status: u16 },
    #[error("网络错误，请重试")]
    Transport(String),
    #[error("登录响应无效")]
    InvalidResponse(String),
    #[error("登录失败，请重试")]
    Interrupted,
}

pub trait Authenticator: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<SessionUser, LoginError>;
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    username: String,
}

/// Posts credentials as JSON to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpAuthenticator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl Authenticator for HttpAuthenticator {
    fn login(&self, credentials: &Credentials) -> Result<SessionUser, LoginError> {
        let body = LoginBody {
            username: &credentials.username,
            password: &credentials.password,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|err| {
                tracing::warn!(endpoint = %self.endpoint, "login request failed: {err}");
                LoginError::Transport(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::info!(endpoint = %self.endpoint, status = status.as_u16(), "login rejected");
            return Err(LoginError::Rejected {
                status: status.as_u16(),
            });
        }

        let payload: LoginResponse = response.json().map_err(|err| {
            tracing::warn!(endpoint = %self.endpoint, "undecodable login response: {err}");
            LoginError::InvalidResponse(err.to_string())
        })?;

        Ok(SessionUser::new(payload.username))
    }
}
