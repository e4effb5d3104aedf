use super::{Notifier, Toast};
use crate::auth::session::AuthProvider;
use crate::router::Route;
use tracing::warn;

pub const LOGIN_OK: &str = "Login realizado com sucesso!";
pub const LOGIN_FAILED: &str = "Erro ao fazer login. Verifique suas credenciais.";

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Signs in. Returns where to navigate on success.
    pub async fn submit(&self, auth: &AuthProvider, notifier: &dyn Notifier) -> Option<Route> {
        match auth.sign_in(self.email.trim(), &self.password).await {
            Ok(_) => {
                notifier.notify(Toast::success(LOGIN_OK));
                Some(Route::Clients)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                notifier.notify(Toast::error(LOGIN_FAILED));
                None
            }
        }
    }
}
