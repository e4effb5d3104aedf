//! Application configuration.
//!
//! The Firebase part mirrors the config object handed out by the Firebase console
//! (`apiKey`, `authDomain`, `projectId`, ...). It can be read from that JSON object
//! or assembled from environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const IDENTITY_TOOLKIT_API: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_API: &str = "https://securetoken.googleapis.com/v1";
const FIRESTORE_V1_API: &str =
    "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents";

const DEFAULT_SESSION_FILE: &str = ".crm-session.json";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The Firebase web app config object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_domain: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging_sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub firebase: FirebaseConfig,
    /// Where the signed-in session (refresh token) is persisted between runs.
    pub session_file: PathBuf,
    /// `host:port` of a local Auth emulator.
    pub auth_emulator_host: Option<String>,
    /// `host:port` of a local Firestore emulator.
    pub firestore_emulator_host: Option<String>,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the Firebase config object from a JSON file. Session and emulator
    /// settings still come from the environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let firebase: FirebaseConfig = serde_json::from_str(&raw)?;
        Self::with_firebase(firebase, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let firebase = FirebaseConfig {
            api_key: lookup("FIREBASE_API_KEY").unwrap_or_default(),
            auth_domain: lookup("FIREBASE_AUTH_DOMAIN"),
            project_id: lookup("FIREBASE_PROJECT_ID").unwrap_or_default(),
            storage_bucket: lookup("FIREBASE_STORAGE_BUCKET"),
            messaging_sender_id: lookup("FIREBASE_MESSAGING_SENDER_ID"),
            app_id: lookup("FIREBASE_APP_ID"),
        };
        Self::with_firebase(firebase, lookup)
    }

    fn with_firebase<F>(firebase: FirebaseConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if firebase.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("apiKey"));
        }
        if firebase.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("projectId"));
        }

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            firebase,
            session_file: non_empty("CRM_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
            auth_emulator_host: non_empty("FIREBASE_AUTH_EMULATOR_HOST"),
            firestore_emulator_host: non_empty("FIRESTORE_EMULATOR_HOST"),
        })
    }

    pub fn identity_toolkit_url(&self) -> String {
        match &self.auth_emulator_host {
            Some(host) => format!("http://{}/identitytoolkit.googleapis.com/v1", host),
            None => IDENTITY_TOOLKIT_API.to_string(),
        }
    }

    pub fn secure_token_url(&self) -> String {
        match &self.auth_emulator_host {
            Some(host) => format!("http://{}/securetoken.googleapis.com/v1", host),
            None => SECURE_TOKEN_API.to_string(),
        }
    }

    pub fn firestore_url(&self) -> String {
        match &self.firestore_emulator_host {
            Some(host) => format!(
                "http://{}/v1/projects/{}/databases/(default)/documents",
                host, self.firebase.project_id
            ),
            None => FIRESTORE_V1_API.replace("{project_id}", &self.firebase.project_id),
        }
    }
}
