//! Routes and the guard in front of them.

use crate::auth::session::AuthState;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Clients,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/registro",
            Route::Clients => "/clientes",
        }
    }

    /// Only signed-in users may render guarded routes.
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Clients)
    }

    fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "/login" => Some(Route::Login),
            "/registro" => Some(Route::Register),
            "/clientes" => Some(Route::Clients),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
    /// A guarded route was requested before the session finished loading.
    Loading,
}

/// Decides what a visit to `path` shows. `/` and unknown paths go to the login
/// page; `/clientes` requires a signed-in user.
pub fn resolve(path: &str, state: &AuthState) -> Resolution {
    let Some(route) = Route::from_path(path) else {
        return Resolution::Redirect(Route::Login);
    };

    if !route.is_protected() {
        return Resolution::Render(route);
    }

    if state.loading {
        Resolution::Loading
    } else if state.is_signed_in() {
        Resolution::Render(route)
    } else {
        Resolution::Redirect(Route::Login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::User;

    fn signed_out() -> AuthState {
        AuthState {
            user: None,
            loading: false,
        }
    }

    fn signed_in() -> AuthState {
        AuthState {
            user: Some(User {
                uid: "uid-ana".to_string(),
                email: Some("ana@example.com".to_string()),
            }),
            loading: false,
        }
    }

    #[test]
    fn test_unauthenticated_clients_redirects_to_login() {
        assert_eq!(
            resolve("/clientes", &signed_out()),
            Resolution::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_authenticated_clients_renders() {
        assert_eq!(
            resolve("/clientes", &signed_in()),
            Resolution::Render(Route::Clients)
        );
    }

    #[test]
    fn test_guard_waits_for_session() {
        let state = AuthState {
            user: None,
            loading: true,
        };
        assert_eq!(resolve("/clientes", &state), Resolution::Loading);
        // Public pages don't wait.
        assert_eq!(resolve("/login", &state), Resolution::Render(Route::Login));
    }

    #[test]
    fn test_root_and_unknown_paths_redirect_to_login() {
        assert_eq!(resolve("/", &signed_in()), Resolution::Redirect(Route::Login));
        assert_eq!(resolve("/nada", &signed_out()), Resolution::Redirect(Route::Login));
    }

    #[test]
    fn test_public_routes() {
        assert_eq!(resolve("/registro", &signed_out()), Resolution::Render(Route::Register));
        assert_eq!(resolve("/login/", &signed_out()), Resolution::Render(Route::Login));
        assert_eq!(Route::Register.to_string(), "/registro");
    }
}
