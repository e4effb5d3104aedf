//! The clients screen: list, search, modal editor, delete.

use super::{Notifier, Toast};
use crate::auth::session::AuthProvider;
use crate::clients::{filter_clients, Client, ClientEntry, ClientRepository};
use crate::router::Route;
use tracing::{error, warn};

pub const LOAD_FAILED: &str = "Erro ao carregar clientes.";
pub const REQUIRED_FIELDS: &str = "Preencha nome e e-mail.";
pub const CREATE_OK: &str = "Cliente cadastrado com sucesso!";
pub const CREATE_FAILED: &str = "Erro ao cadastrar cliente.";
pub const UPDATE_OK: &str = "Cliente atualizado com sucesso!";
pub const UPDATE_FAILED: &str = "Erro ao atualizar cliente.";
pub const DELETE_OK: &str = "Cliente excluído com sucesso!";
pub const DELETE_FAILED: &str = "Erro ao excluir cliente.";
pub const LOGOUT_OK: &str = "Logout realizado com sucesso!";
pub const LOGOUT_FAILED: &str = "Erro ao fazer logout.";

/// State of the modal form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientEditor {
    /// `None` when creating a new client.
    pub editing: Option<String>,
    pub form: Client,
}

impl ClientEditor {
    pub fn is_new(&self) -> bool {
        self.editing.is_none()
    }
}

pub struct ClientsPage<R> {
    repo: R,
    clients: Vec<ClientEntry>,
    search: String,
    editor: Option<ClientEditor>,
    loading: bool,
}

impl<R: ClientRepository> ClientsPage<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            clients: Vec::new(),
            search: String::new(),
            editor: None,
            loading: false,
        }
    }

    pub fn clients(&self) -> &[ClientEntry] {
        &self.clients
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Fetches every client. Returns `false` (and keeps the previous list) on failure.
    pub async fn load(&mut self, notifier: &dyn Notifier) -> bool {
        self.loading = true;
        let result = self.repo.list().await;
        self.loading = false;

        match result {
            Ok(clients) => {
                self.clients = clients;
                true
            }
            Err(e) => {
                error!(error = %e, "failed to load clients");
                notifier.notify(Toast::error(LOAD_FAILED));
                false
            }
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// The rows matching the current search.
    pub fn visible(&self) -> Vec<&ClientEntry> {
        filter_clients(&self.clients, &self.search)
    }

    pub fn editor(&self) -> Option<&ClientEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut ClientEditor> {
        self.editor.as_mut()
    }

    pub fn is_modal_open(&self) -> bool {
        self.editor.is_some()
    }

    pub fn open_create(&mut self) {
        self.editor = Some(ClientEditor::default());
    }

    /// Opens the editor filled with the client's current data. Returns `false`
    /// if no loaded client has this ID.
    pub fn open_edit(&mut self, id: &str) -> bool {
        match self.clients.iter().find(|e| e.id == id) {
            Some(entry) => {
                self.editor = Some(ClientEditor {
                    editing: Some(entry.id.clone()),
                    form: entry.client.clone(),
                });
                true
            }
            None => false,
        }
    }

    pub fn close_modal(&mut self) {
        self.editor = None;
    }

    /// Submits the modal. On success the list reflects the write and the modal
    /// closes; on failure the modal stays open with the form intact.
    pub async fn save(&mut self, notifier: &dyn Notifier) -> bool {
        let Some(editor) = self.editor.clone() else {
            return false;
        };

        let form = Client {
            nome: editor.form.nome.trim().to_string(),
            email: editor.form.email.trim().to_string(),
            telefone: editor.form.telefone.trim().to_string(),
            endereco: editor.form.endereco.trim().to_string(),
        };
        if form.nome.is_empty() || form.email.is_empty() {
            notifier.notify(Toast::error(REQUIRED_FIELDS));
            return false;
        }

        match editor.editing {
            None => match self.repo.add(&form).await {
                Ok(id) => {
                    self.clients.push(ClientEntry { id, client: form });
                    self.editor = None;
                    notifier.notify(Toast::success(CREATE_OK));
                    true
                }
                Err(e) => {
                    error!(error = %e, "failed to create client");
                    notifier.notify(Toast::error(CREATE_FAILED));
                    false
                }
            },
            Some(id) => match self.repo.update(&id, &form).await {
                Ok(()) => {
                    if let Some(entry) = self.clients.iter_mut().find(|e| e.id == id) {
                        entry.client = form;
                    }
                    self.editor = None;
                    notifier.notify(Toast::success(UPDATE_OK));
                    true
                }
                Err(e) => {
                    error!(error = %e, %id, "failed to update client");
                    notifier.notify(Toast::error(UPDATE_FAILED));
                    false
                }
            },
        }
    }

    /// Deletes a client once `confirm` approves it. Nothing happens if the ID
    /// is unknown or the user declines.
    pub async fn delete<F>(&mut self, id: &str, confirm: F, notifier: &dyn Notifier) -> bool
    where
        F: FnOnce(&Client) -> bool,
    {
        let Some(entry) = self.clients.iter().find(|e| e.id == id) else {
            warn!(%id, "delete requested for unknown client");
            return false;
        };
        if !confirm(&entry.client) {
            return false;
        }

        match self.repo.delete(id).await {
            Ok(()) => {
                self.clients.retain(|e| e.id != id);
                notifier.notify(Toast::success(DELETE_OK));
                true
            }
            Err(e) => {
                error!(error = %e, %id, "failed to delete client");
                notifier.notify(Toast::error(DELETE_FAILED));
                false
            }
        }
    }

    /// Signs out. Returns where to navigate on success.
    pub async fn logout(&mut self, auth: &AuthProvider, notifier: &dyn Notifier) -> Option<Route> {
        match auth.sign_out().await {
            Ok(()) => {
                self.clients.clear();
                self.editor = None;
                notifier.notify(Toast::success(LOGOUT_OK));
                Some(Route::Login)
            }
            Err(e) => {
                error!(error = %e, "logout failed");
                notifier.notify(Toast::error(LOGOUT_FAILED));
                None
            }
        }
    }
}
