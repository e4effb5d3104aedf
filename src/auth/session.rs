//! Signed-in session state.
//!
//! [`AuthProvider`] owns the current user and their tokens and publishes every
//! change through a `watch` channel, so observers see sign-in, sign-out and the
//! end of the initial session restore.

use super::models::{AccountInfo, SignInResponse};
use super::{AuthError, FirebaseAuth};
use crate::core::middleware::TokenSource;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// ID tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    /// True until the persisted session has been restored (or found absent).
    pub loading: bool,
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    fn new(id_token: String, refresh_token: String, expires_in: &str) -> Self {
        let secs = expires_in.trim().parse::<i64>().unwrap_or(3600);
        Self {
            id_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(secs),
        }
    }

    fn needs_refresh(&self) -> bool {
        Utc::now() + Duration::seconds(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedSession {
    pub uid: String,
    pub email: Option<String>,
    pub refresh_token: String,
}

/// Keeps the refresh token on disk between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<PersistedSession>, AuthError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, session: &PersistedSession) -> Result<(), AuthError> {
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct AuthProvider {
    auth: FirebaseAuth,
    store: Option<SessionStore>,
    state: watch::Sender<AuthState>,
    credentials: RwLock<Option<Credentials>>,
}

impl AuthProvider {
    /// Creates a provider in the loading state. Call [`restore`](Self::restore)
    /// to finish loading, with or without a persisted session.
    pub fn new(auth: FirebaseAuth, store: Option<SessionStore>) -> Self {
        let (state, _) = watch::channel(AuthState {
            user: None,
            loading: true,
        });
        Self {
            auth,
            store,
            state,
            credentials: RwLock::new(None),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Observes auth state changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Restores the persisted session, if any. A session the server rejects, or
    /// a file that no longer parses, is discarded; any other failure keeps the
    /// file for the next run. Always leaves the provider out of the loading state.
    pub async fn restore(&self) -> Option<User> {
        let user = match self.try_restore().await {
            Ok(user) => user,
            Err(e @ (AuthError::Rejected(_) | AuthError::SerializationError(_))) => {
                warn!(error = %e, "discarding persisted session");
                if let Some(store) = &self.store {
                    if let Err(e) = store.clear().await {
                        warn!(error = %e, "failed to remove session file");
                    }
                }
                None
            }
            Err(e) => {
                warn!(error = %e, "could not restore session, keeping it for later");
                None
            }
        };

        self.state.send_replace(AuthState {
            user: user.clone(),
            loading: false,
        });
        user
    }

    async fn try_restore(&self) -> Result<Option<User>, AuthError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let Some(persisted) = store.load().await? else {
            debug!(path = %store.path().display(), "no persisted session");
            return Ok(None);
        };

        let refreshed = self.auth.refresh(&persisted.refresh_token).await?;
        let user = User {
            uid: refreshed.user_id.clone(),
            email: persisted.email,
        };

        let credentials = Credentials::new(
            refreshed.id_token,
            refreshed.refresh_token,
            &refreshed.expires_in,
        );
        self.persist(&user, &credentials.refresh_token).await;
        *self.credentials.write().await = Some(credentials);

        info!(uid = %user.uid, "session restored");
        Ok(Some(user))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let response = self.auth.sign_in_with_password(email, password).await?;
        let user = self.establish(response).await;
        info!(uid = %user.uid, "signed in");
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let response = self.auth.sign_up(email, password).await?;
        let user = self.establish(response).await;
        info!(uid = %user.uid, "account created");
        Ok(user)
    }

    /// Signs out locally: tokens are dropped and the session file removed.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        *self.credentials.write().await = None;
        self.state.send_replace(AuthState {
            user: None,
            loading: false,
        });
        if let Some(store) = &self.store {
            store.clear().await?;
        }
        info!("signed out");
        Ok(())
    }

    /// The current ID token, refreshed first if it is about to expire.
    pub async fn id_token(&self) -> Result<Option<String>, AuthError> {
        {
            let credentials = self.credentials.read().await;
            match &*credentials {
                None => return Ok(None),
                Some(c) if !c.needs_refresh() => return Ok(Some(c.id_token.clone())),
                Some(_) => {}
            }
        }

        let mut credentials = self.credentials.write().await;
        let Some(current) = credentials.as_ref() else {
            return Ok(None);
        };
        // Another caller may have refreshed while we waited for the lock.
        if !current.needs_refresh() {
            return Ok(Some(current.id_token.clone()));
        }

        debug!("refreshing ID token");
        let refreshed = match self.auth.refresh(&current.refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(AuthError::Rejected(code)) => {
                warn!(%code, "refresh rejected, signing out");
                *credentials = None;
                drop(credentials);
                self.state.send_replace(AuthState {
                    user: None,
                    loading: false,
                });
                if let Some(store) = &self.store {
                    store.clear().await?;
                }
                return Err(AuthError::Rejected(code));
            }
            Err(e) => return Err(e),
        };

        let fresh = Credentials::new(
            refreshed.id_token,
            refreshed.refresh_token,
            &refreshed.expires_in,
        );
        let token = fresh.id_token.clone();
        if let Some(user) = self.current_user() {
            self.persist(&user, &fresh.refresh_token).await;
        }
        *credentials = Some(fresh);
        Ok(Some(token))
    }

    /// Server-side account details for the signed-in user.
    pub async fn account(&self) -> Result<Option<AccountInfo>, AuthError> {
        match self.id_token().await? {
            Some(token) => Ok(Some(self.auth.lookup(&token).await?)),
            None => Ok(None),
        }
    }

    async fn establish(&self, response: SignInResponse) -> User {
        let user = User {
            uid: response.local_id,
            email: response.email,
        };
        let credentials = Credentials::new(
            response.id_token,
            response.refresh_token,
            &response.expires_in,
        );

        self.persist(&user, &credentials.refresh_token).await;
        *self.credentials.write().await = Some(credentials);
        self.state.send_replace(AuthState {
            user: Some(user.clone()),
            loading: false,
        });
        user
    }

    /// Persistence failures only cost the next run its session, so they are logged.
    async fn persist(&self, user: &User, refresh_token: &str) {
        let Some(store) = &self.store else {
            return;
        };
        let session = PersistedSession {
            uid: user.uid.clone(),
            email: user.email.clone(),
            refresh_token: refresh_token.to_string(),
        };
        if let Err(e) = store.save(&session).await {
            warn!(error = %e, path = %store.path().display(), "failed to persist session");
        }
    }

    #[cfg(test)]
    pub(crate) async fn expire_token(&self) {
        if let Some(c) = self.credentials.write().await.as_mut() {
            c.expires_at = Utc::now();
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for AuthProvider {
    async fn id_token(&self) -> Result<Option<String>, anyhow::Error> {
        Ok(AuthProvider::id_token(self).await?)
    }
}
