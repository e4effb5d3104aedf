pub mod auth;
pub mod clients;
pub mod config;
pub mod core;
pub mod firestore;
pub mod pages;
pub mod router;

use auth::session::{AuthProvider, SessionStore};
use auth::FirebaseAuth;
use clients::FirestoreClientRepository;
use config::AppConfig;
use firestore::FirebaseFirestore;
use std::sync::Arc;

use crate::core::middleware::IdTokenMiddleware;

/// Wires the configured Firebase project to the session provider and the
/// client repository.
pub struct CrmApp {
    config: AppConfig,
    auth: Arc<AuthProvider>,
}

impl CrmApp {
    pub fn new(config: AppConfig) -> Self {
        let auth = FirebaseAuth::new(
            crate::core::build_client(),
            config.firebase.api_key.clone(),
            config.identity_toolkit_url(),
            config.secure_token_url(),
        );
        let store = SessionStore::new(config.session_file.clone());

        Self {
            auth: Arc::new(AuthProvider::new(auth, Some(store))),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn auth(&self) -> Arc<AuthProvider> {
        self.auth.clone()
    }

    /// A Firestore client whose requests are made as the signed-in user.
    pub fn firestore(&self) -> FirebaseFirestore {
        let middleware = IdTokenMiddleware::new(self.auth.clone());
        FirebaseFirestore::new(
            crate::core::build_client_with(middleware),
            self.config.firestore_url(),
        )
    }

    pub fn clients(&self) -> FirestoreClientRepository {
        FirestoreClientRepository::new(self.firestore())
    }
}
