use super::clients::{self, ClientsPage};
use super::login::{self, LoginForm};
use super::register::{self, RegisterForm};
use super::*;
use crate::auth::session::AuthProvider;
use crate::auth::FirebaseAuth;
use crate::clients::{Client, ClientEntry, ClientRepository};
use crate::firestore::FirestoreError;
use crate::router::Route;
use httpmock::prelude::*;
use reqwest::Client as HttpClient;
use reqwest_middleware::ClientBuilder;
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    fn last(&self) -> Option<Toast> {
        self.toasts.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

#[derive(Default)]
struct Store {
    docs: Vec<ClientEntry>,
    next_id: usize,
    adds: usize,
    updates: Vec<String>,
    deletes: Vec<String>,
    failing: bool,
}

#[derive(Clone, Default)]
struct MemoryRepo(Arc<Mutex<Store>>);

impl MemoryRepo {
    fn with(clients: &[(&str, &str, &str)]) -> Self {
        let repo = Self::default();
        {
            let mut store = repo.0.lock().unwrap();
            for (id, nome, email) in clients {
                store.docs.push(ClientEntry {
                    id: id.to_string(),
                    client: Client {
                        nome: nome.to_string(),
                        email: email.to_string(),
                        ..Default::default()
                    },
                });
            }
        }
        repo
    }

    fn fail(&self) {
        self.0.lock().unwrap().failing = true;
    }

    fn check(&self) -> Result<(), FirestoreError> {
        if self.0.lock().unwrap().failing {
            Err(FirestoreError::ApiError("unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl ClientRepository for MemoryRepo {
    async fn list(&self) -> Result<Vec<ClientEntry>, FirestoreError> {
        self.check()?;
        Ok(self.0.lock().unwrap().docs.clone())
    }

    async fn add(&self, client: &Client) -> Result<String, FirestoreError> {
        self.check()?;
        let mut store = self.0.lock().unwrap();
        store.next_id += 1;
        store.adds += 1;
        let id = format!("new-{}", store.next_id);
        store.docs.push(ClientEntry {
            id: id.clone(),
            client: client.clone(),
        });
        Ok(id)
    }

    async fn update(&self, id: &str, client: &Client) -> Result<(), FirestoreError> {
        self.check()?;
        let mut store = self.0.lock().unwrap();
        store.updates.push(id.to_string());
        match store.docs.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.client = client.clone();
                Ok(())
            }
            None => Err(FirestoreError::NotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), FirestoreError> {
        self.check()?;
        let mut store = self.0.lock().unwrap();
        store.deletes.push(id.to_string());
        store.docs.retain(|e| e.id != id);
        Ok(())
    }
}

fn provider(server: &MockServer) -> AuthProvider {
    let client = ClientBuilder::new(HttpClient::new()).build();
    let auth = FirebaseAuth::new(
        client,
        "test-key",
        server.url("/identitytoolkit.googleapis.com/v1"),
        server.url("/securetoken.googleapis.com/v1"),
    );
    AuthProvider::new(auth, None)
}

fn sign_in_ok() -> serde_json::Value {
    json!({
        "localId": "uid-ana",
        "email": "ana@example.com",
        "idToken": "id-1",
        "refreshToken": "refresh-1",
        "expiresIn": "3600",
        "registered": true
    })
}

#[tokio::test]
async fn test_login_navigates_to_clients() {
    let server = MockServer::start();
    let auth = provider(&server);
    let notifier = RecordingNotifier::default();

    server.mock(|when, then| {
        when.method(POST)
            .path("/identitytoolkit.googleapis.com/v1/accounts:signInWithPassword")
            .json_body(json!({
                "email": "ana@example.com",
                "password": "segredo1",
                "returnSecureToken": true
            }));
        then.status(200).json_body(sign_in_ok());
    });

    let form = LoginForm::new(" ana@example.com ", "segredo1");
    assert_eq!(form.submit(&auth, &notifier).await, Some(Route::Clients));
    assert_eq!(notifier.last(), Some(Toast::success(login::LOGIN_OK)));
    assert!(auth.current_user().is_some());
}

#[tokio::test]
async fn test_login_failure_stays_and_toasts() {
    let server = MockServer::start();
    let auth = provider(&server);
    let notifier = RecordingNotifier::default();

    server.mock(|when, then| {
        when.method(POST)
            .path("/identitytoolkit.googleapis.com/v1/accounts:signInWithPassword");
        then.status(400)
            .json_body(json!({ "error": { "code": 400, "message": "INVALID_LOGIN_CREDENTIALS" } }));
    });

    let form = LoginForm::new("ana@example.com", "errada");
    assert_eq!(form.submit(&auth, &notifier).await, None);
    assert_eq!(notifier.last(), Some(Toast::error(login::LOGIN_FAILED)));
    assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn test_register_mismatch_makes_no_network_call() {
    let server = MockServer::start();
    let auth = provider(&server);
    let notifier = RecordingNotifier::default();

    let sign_up = server.mock(|when, then| {
        when.method(POST)
            .path("/identitytoolkit.googleapis.com/v1/accounts:signUp");
        then.status(200).json_body(sign_in_ok());
    });

    let form = RegisterForm::new("ana@example.com", "segredo1", "segredo2");
    assert_eq!(form.submit(&auth, &notifier).await, None);
    assert_eq!(notifier.toasts(), vec![Toast::error(register::PASSWORD_MISMATCH)]);
    sign_up.assert_calls(0);
}

#[tokio::test]
async fn test_register_short_password_makes_no_network_call() {
    let server = MockServer::start();
    let auth = provider(&server);
    let notifier = RecordingNotifier::default();

    let sign_up = server.mock(|when, then| {
        when.method(POST)
            .path("/identitytoolkit.googleapis.com/v1/accounts:signUp");
        then.status(200).json_body(sign_in_ok());
    });

    let form = RegisterForm::new("ana@example.com", "123", "123");
    assert_eq!(form.submit(&auth, &notifier).await, None);
    assert_eq!(notifier.last(), Some(Toast::error(register::PASSWORD_TOO_SHORT)));
    sign_up.assert_calls(0);
}

#[tokio::test]
async fn test_register_success() {
    let server = MockServer::start();
    let auth = provider(&server);
    let notifier = RecordingNotifier::default();

    let sign_up = server.mock(|when, then| {
        when.method(POST)
            .path("/identitytoolkit.googleapis.com/v1/accounts:signUp");
        then.status(200).json_body(sign_in_ok());
    });

    let form = RegisterForm::new("ana@example.com", "segredo1", "segredo1");
    assert_eq!(form.submit(&auth, &notifier).await, Some(Route::Clients));
    assert_eq!(notifier.last(), Some(Toast::success(register::REGISTER_OK)));
    sign_up.assert();
}

#[tokio::test]
async fn test_register_rejected() {
    let server = MockServer::start();
    let auth = provider(&server);
    let notifier = RecordingNotifier::default();

    server.mock(|when, then| {
        when.method(POST)
            .path("/identitytoolkit.googleapis.com/v1/accounts:signUp");
        then.status(400)
            .json_body(json!({ "error": { "code": 400, "message": "EMAIL_EXISTS" } }));
    });

    let form = RegisterForm::new("ana@example.com", "segredo1", "segredo1");
    assert_eq!(form.submit(&auth, &notifier).await, None);
    assert_eq!(notifier.last(), Some(Toast::error(register::REGISTER_FAILED)));
}

#[tokio::test]
async fn test_load_and_search() {
    let repo = MemoryRepo::with(&[
        ("a", "Ana Souza", "ana@example.com"),
        ("b", "Bruno Lima", "bruno@empresa.com.br"),
    ]);
    let notifier = RecordingNotifier::default();
    let mut page = ClientsPage::new(repo);

    assert!(page.load(&notifier).await);
    assert_eq!(page.visible().len(), 2);

    page.set_search("BRUNO");
    let visible: Vec<&str> = page.visible().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(visible, vec!["b"]);

    page.set_search("");
    assert_eq!(page.visible().len(), 2);
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_load_failure_toasts() {
    let repo = MemoryRepo::default();
    repo.fail();
    let notifier = RecordingNotifier::default();
    let mut page = ClientsPage::new(repo);

    assert!(!page.load(&notifier).await);
    assert!(page.clients().is_empty());
    assert!(!page.is_loading());
    assert_eq!(notifier.last(), Some(Toast::error(clients::LOAD_FAILED)));
}

#[tokio::test]
async fn test_create_adds_one_document_and_closes_modal() {
    let repo = MemoryRepo::default();
    let notifier = RecordingNotifier::default();
    let mut page = ClientsPage::new(repo.clone());
    page.load(&notifier).await;

    page.open_create();
    assert!(page.editor().unwrap().is_new());
    {
        let editor = page.editor_mut().unwrap();
        editor.form.nome = "Carla Dias".to_string();
        editor.form.email = "carla@example.com".to_string();
        editor.form.telefone = "(31) 96666-0003".to_string();
        editor.form.endereco = "Praça da Sé, 1".to_string();
    }

    assert!(page.save(&notifier).await);
    assert!(!page.is_modal_open());
    assert_eq!(page.clients().len(), 1);
    assert_eq!(page.clients()[0].id, "new-1");
    assert_eq!(repo.0.lock().unwrap().adds, 1);
    assert_eq!(notifier.last(), Some(Toast::success(clients::CREATE_OK)));
}

#[tokio::test]
async fn test_create_requires_name_and_email() {
    let repo = MemoryRepo::default();
    let notifier = RecordingNotifier::default();
    let mut page = ClientsPage::new(repo.clone());

    page.open_create();
    page.editor_mut().unwrap().form.nome = "  ".to_string();

    assert!(!page.save(&notifier).await);
    assert!(page.is_modal_open());
    assert_eq!(repo.0.lock().unwrap().adds, 0);
    assert_eq!(notifier.last(), Some(Toast::error(clients::REQUIRED_FIELDS)));

    page.close_modal();
    assert!(page.editor().is_none());
}

#[tokio::test]
async fn test_create_failure_keeps_modal_open() {
    let repo = MemoryRepo::default();
    let notifier = RecordingNotifier::default();
    let mut page = ClientsPage::new(repo.clone());

    page.open_create();
    {
        let editor = page.editor_mut().unwrap();
        editor.form.nome = "Carla".to_string();
        editor.form.email = "carla@example.com".to_string();
    }
    repo.fail();

    assert!(!page.save(&notifier).await);
    assert!(page.is_modal_open());
    assert_eq!(page.editor().unwrap().form.nome, "Carla");
    assert_eq!(notifier.last(), Some(Toast::error(clients::CREATE_FAILED)));
}

#[tokio::test]
async fn test_edit_updates_same_document() {
    let repo = MemoryRepo::with(&[
        ("a", "Ana Souza", "ana@example.com"),
        ("b", "Bruno Lima", "bruno@empresa.com.br"),
    ]);
    let notifier = RecordingNotifier::default();
    let mut page = ClientsPage::new(repo.clone());
    page.load(&notifier).await;

    assert!(!page.open_edit("missing"));
    assert!(page.open_edit("b"));
    assert_eq!(page.editor().unwrap().form.nome, "Bruno Lima");
    page.editor_mut().unwrap().form.telefone = "(21) 90000-0000".to_string();

    assert!(page.save(&notifier).await);
    assert!(!page.is_modal_open());

    let store = repo.0.lock().unwrap();
    assert_eq!(store.updates, vec!["b".to_string()]);
    assert_eq!(store.adds, 0);
    assert_eq!(store.docs.len(), 2);
    drop(store);

    let edited = page.clients().iter().find(|e| e.id == "b").unwrap();
    assert_eq!(edited.client.telefone, "(21) 90000-0000");
    assert_eq!(notifier.last(), Some(Toast::success(clients::UPDATE_OK)));
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let repo = MemoryRepo::with(&[("a", "Ana Souza", "ana@example.com")]);
    let notifier = RecordingNotifier::default();
    let mut page = ClientsPage::new(repo.clone());
    page.load(&notifier).await;

    assert!(!page.delete("a", |_| false, &notifier).await);
    assert_eq!(page.clients().len(), 1);
    assert!(repo.0.lock().unwrap().deletes.is_empty());

    let mut asked_about = None;
    assert!(
        page.delete(
            "a",
            |client| {
                asked_about = Some(client.nome.clone());
                true
            },
            &notifier
        )
        .await
    );
    assert_eq!(asked_about.as_deref(), Some("Ana Souza"));
    assert!(page.clients().is_empty());
    assert_eq!(repo.0.lock().unwrap().deletes, vec!["a".to_string()]);
    assert_eq!(notifier.last(), Some(Toast::success(clients::DELETE_OK)));
}

#[tokio::test]
async fn test_delete_failure_keeps_row() {
    let repo = MemoryRepo::with(&[("a", "Ana Souza", "ana@example.com")]);
    let notifier = RecordingNotifier::default();
    let mut page = ClientsPage::new(repo.clone());
    page.load(&notifier).await;
    repo.fail();

    assert!(!page.delete("a", |_| true, &notifier).await);
    assert_eq!(page.clients().len(), 1);
    assert_eq!(notifier.last(), Some(Toast::error(clients::DELETE_FAILED)));
}

#[tokio::test]
async fn test_logout_returns_to_login() {
    let server = MockServer::start();
    let auth = provider(&server);
    let notifier = RecordingNotifier::default();

    server.mock(|when, then| {
        when.method(POST)
            .path("/identitytoolkit.googleapis.com/v1/accounts:signInWithPassword");
        then.status(200).json_body(sign_in_ok());
    });
    auth.sign_in("ana@example.com", "segredo1").await.unwrap();

    let mut page = ClientsPage::new(MemoryRepo::with(&[("a", "Ana", "ana@example.com")]));
    page.load(&notifier).await;

    assert_eq!(page.logout(&auth, &notifier).await, Some(Route::Login));
    assert!(auth.current_user().is_none());
    assert!(page.clients().is_empty());
    assert_eq!(notifier.last(), Some(Toast::success(clients::LOGOUT_OK)));
}
