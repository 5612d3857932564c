use std::env;
use std::path::PathBuf;

use diigo_core::{
    CredentialProvider, Credentials, DiigoError, ExportOptions, StaticCredentials, API_KEY_ENV,
    PASSWORD_ENV,
};
use secrecy::SecretString;

use crate::prompts::PromptCredentials;
use crate::Cli;

const API_KEYS_URL: &str = "https://www.diigo.com/api_keys";

/// Process-wide settings, resolved once from flags and the environment.
pub struct Settings {
    api_key: SecretString,
    username: Option<String>,
    password: Option<String>,
    csv_path: PathBuf,
    encoding: String,
    page_size: u32,
    timeout_secs: u64,
    root_folder: String,
    base_url: Option<String>,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self, DiigoError> {
        let api_key = resolve_api_key(env::var(API_KEY_ENV).ok())?;
        let password = env::var(PASSWORD_ENV).ok().filter(|value| !value.is_empty());

        Ok(Self {
            api_key,
            username: normalize_optional(cli.username.clone()),
            password,
            csv_path: cli.output.clone(),
            encoding: cli.encoding.clone(),
            page_size: cli.page_size,
            timeout_secs: cli.timeout,
            root_folder: cli.folder.clone(),
            base_url: normalize_optional(cli.base_url.clone()),
        })
    }

    /// Non-interactive when both username and password are preset.
    pub fn credential_provider(&self) -> Box<dyn CredentialProvider> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Box::new(StaticCredentials::new(username.clone(), password.clone()))
            }
            _ => Box::new(PromptCredentials {
                username: self.username.clone(),
            }),
        }
    }

    pub fn into_export_options(self, provider: &dyn CredentialProvider) -> Result<ExportOptions, DiigoError> {
        let credentials = Credentials::from_provider(provider, self.api_key)?;
        Ok(ExportOptions {
            csv_path: self.csv_path,
            encoding: self.encoding,
            page_size: self.page_size,
            timeout_secs: self.timeout_secs,
            root_folder: self.root_folder,
            base_url: self.base_url,
            ..ExportOptions::new(credentials)
        })
    }
}

/// The key is only ever taken from the environment, never from argv.
fn resolve_api_key(value: Option<String>) -> Result<SecretString, DiigoError> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .map(SecretString::new)
        .ok_or_else(|| {
            DiigoError::Auth(format!(
                "API key environment variable not set: {API_KEY_ENV}. Get one from {API_KEYS_URL}"
            ))
        })
}

fn normalize_optional(input: Option<String>) -> Option<String> {
    input
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use diigo_core::ErrorKind;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn missing_api_key_is_an_auth_error() {
        for value in [None, Some("   ".to_string())] {
            let err = resolve_api_key(value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Auth);
            assert!(err.to_string().contains(API_KEY_ENV));
        }
    }

    #[test]
    fn api_key_is_trimmed() {
        let key = resolve_api_key(Some(" abc \n".to_string())).expect("key");
        assert_eq!(key.expose_secret(), "abc");
    }
}
