//! Credential sources for the Diigo API.
//!
//! The API key is configured once per process and handed in by the caller.
//! Username and password come from a [`CredentialProvider`], so the CLI can
//! prompt interactively while tests and scripted runs use
//! [`StaticCredentials`].

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::DiigoError;

pub const API_KEY_ENV: &str = "DIIGO_API_KEY";
pub const USERNAME_ENV: &str = "DIIGO_USERNAME";
pub const PASSWORD_ENV: &str = "DIIGO_PASSWORD";

/// Username and password for HTTP Basic authentication.
pub struct Login {
    pub username: String,
    pub password: SecretString,
}

pub trait CredentialProvider {
    fn login(&self) -> Result<Login, DiigoError>;
}

/// Fixed credentials, e.g. read from the environment.
pub struct StaticCredentials {
    username: String,
    password: SecretString,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn login(&self) -> Result<Login, DiigoError> {
        Ok(Login {
            username: self.username.clone(),
            password: SecretString::new(self.password.expose_secret().clone()),
        })
    }
}

/// Everything needed to sign a request: Basic auth plus the `key` parameter.
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub api_key: SecretString,
}

impl Credentials {
    pub fn new(login: Login, api_key: SecretString) -> Result<Self, DiigoError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(DiigoError::Auth(format!(
                "API key is empty; set {API_KEY_ENV} (keys are issued at https://www.diigo.com/api_keys)"
            )));
        }
        let username = login.username.trim().to_string();
        if username.is_empty() {
            return Err(DiigoError::Auth("username must not be empty".to_string()));
        }
        Ok(Self {
            username,
            password: login.password,
            api_key,
        })
    }

    pub fn from_provider(
        provider: &dyn CredentialProvider,
        api_key: SecretString,
    ) -> Result<Self, DiigoError> {
        Self::new(provider.login()?, api_key)
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            username: self.username.clone(),
            password: SecretString::new(self.password.expose_secret().clone()),
            api_key: SecretString::new(self.api_key.expose_secret().clone()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
