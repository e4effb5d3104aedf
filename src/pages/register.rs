use super::{Notifier, Toast};
use crate::auth::session::AuthProvider;
use crate::router::Route;
use tracing::warn;

pub const PASSWORD_MISMATCH: &str = "As senhas não coincidem!";
pub const PASSWORD_TOO_SHORT: &str = "A senha deve ter pelo menos 6 caracteres.";
pub const REGISTER_OK: &str = "Conta criada com sucesso!";
pub const REGISTER_FAILED: &str = "Erro ao criar conta. Tente novamente.";

/// Firebase rejects shorter passwords with `WEAK_PASSWORD`.
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// The message to show if the form must not be sent.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.password != self.confirm_password {
            return Err(PASSWORD_MISMATCH);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PASSWORD_TOO_SHORT);
        }
        Ok(())
    }

    /// Creates the account and signs in. Returns where to navigate on success.
    pub async fn submit(&self, auth: &AuthProvider, notifier: &dyn Notifier) -> Option<Route> {
        if let Err(message) = self.validate() {
            notifier.notify(Toast::error(message));
            return None;
        }

        match auth.sign_up(self.email.trim(), &self.password).await {
            Ok(_) => {
                notifier.notify(Toast::success(REGISTER_OK));
                Some(Route::Clients)
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                notifier.notify(Toast::error(REGISTER_FAILED));
                None
            }
        }
    }
}
