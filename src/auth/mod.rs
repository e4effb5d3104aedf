//! Firebase Authentication (email/password) over the Identity Toolkit REST API.
//!
//! [`FirebaseAuth`] is the raw client. [`session::AuthProvider`] builds the signed-in
//! session on top of it and is what the rest of the crate talks to.

pub mod models;
pub mod session;

use crate::auth::models::{
    AccountInfo, LookupRequest, LookupResponse, PasswordRequest, RefreshTokenResponse,
    SignInResponse,
};
use crate::core::FirebaseErrorResponse;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use thiserror::Error;


/// Error codes the Identity Toolkit and Secure Token APIs put in `error.message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailExists,
    EmailNotFound,
    InvalidPassword,
    InvalidLoginCredentials,
    UserDisabled,
    WeakPassword,
    InvalidEmail,
    TooManyAttempts,
    TokenExpired,
    InvalidRefreshToken,
    Other(String),
}

impl AuthErrorCode {
    /// Parses messages such as `EMAIL_EXISTS` or
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn from_message(message: &str) -> Self {
        let code = message.split(" : ").next().unwrap_or(message).trim();
        match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "EMAIL_NOT_FOUND" => Self::EmailNotFound,
            "INVALID_PASSWORD" => Self::InvalidPassword,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidLoginCredentials,
            "USER_DISABLED" => Self::UserDisabled,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "TOKEN_EXPIRED" | "USER_NOT_FOUND" => Self::TokenExpired,
            "INVALID_REFRESH_TOKEN" => Self::InvalidRefreshToken,
            _ => Self::Other(message.to_string()),
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EmailExists => "email already in use",
            Self::EmailNotFound => "no account for this email",
            Self::InvalidPassword => "wrong password",
            Self::InvalidLoginCredentials => "invalid login credentials",
            Self::UserDisabled => "account disabled",
            Self::WeakPassword => "password too weak",
            Self::InvalidEmail => "malformed email address",
            Self::TooManyAttempts => "too many attempts, try later",
            Self::TokenExpired => "session expired",
            Self::InvalidRefreshToken => "invalid refresh token",
            Self::Other(message) => message.as_str(),
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("Authentication rejected: {0}")]
    Rejected(AuthErrorCode),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Session storage error: {0}")]
    SessionStorage(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct FirebaseAuth {
    client: ClientWithMiddleware,
    api_key: String,
    identity_url: String,
    token_url: String,
}

impl FirebaseAuth {
    /// `identity_url` is the Identity Toolkit v1 root, `token_url` the Secure Token v1 root.
    pub fn new(
        client: ClientWithMiddleware,
        api_key: impl Into<String>,
        identity_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            identity_url: identity_url.into(),
            token_url: token_url.into(),
        }
    }

    /// Creates an email/password account. The new user comes back signed in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignInResponse, AuthError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.post_accounts("accounts:signUp", &request, "Sign up failed")
            .await
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInResponse, AuthError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.post_accounts("accounts:signInWithPassword", &request, "Sign in failed")
            .await
    }

    /// Exchanges a refresh token for a fresh ID token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshTokenResponse, AuthError> {
        let url = format!("{}/token", self.token_url);

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "refresh_token")
            .append_pair("refresh_token", refresh_token)
            .finish();

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Token refresh failed").await);
        }

        Ok(response.json().await?)
    }

    /// Fetches the account behind an ID token.
    pub async fn lookup(&self, id_token: &str) -> Result<AccountInfo, AuthError> {
        let request = LookupRequest { id_token };
        let result: LookupResponse = self
            .post_accounts("accounts:lookup", &request, "Lookup failed")
            .await?;

        result
            .users
            .and_then(|mut users| users.pop())
            .ok_or(AuthError::Rejected(AuthErrorCode::TokenExpired))
    }

    async fn post_accounts<B, T>(&self, method: &str, body: &B, default_msg: &str) -> Result<T, AuthError>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.identity_url, method);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, default_msg).await);
        }

        Ok(response.json().await?)
    }
}

/// Only 4xx answers carrying an error code are rejections; server errors stay `ApiError`.
async fn rejection(response: reqwest::Response, default_msg: &str) -> AuthError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<FirebaseErrorResponse>(&text) {
        Ok(error) if status.is_client_error() => {
            AuthError::Rejected(AuthErrorCode::from_message(&error.error.message))
        }
        Ok(error) => AuthError::ApiError(format!(
            "{} {}: {}",
            default_msg, status, error.error.message
        )),
        Err(_) => AuthError::ApiError(format!("{} {}: {}", default_msg, status, text)),
    }
}
