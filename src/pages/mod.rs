//! Page handlers: form state plus what happens on submit.
//!
//! Failures never propagate out of a page. They are logged and reported to
//! the user as a toast through a [`Notifier`].

pub mod clients;
pub mod login;
pub mod register;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

/// Where toasts go.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}
