//! `crm`: terminal front end for the clients manager.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use firebase_crm::auth::session::AuthProvider;
use firebase_crm::clients::ClientRepository;
use firebase_crm::config::AppConfig;
use firebase_crm::core::logging::init_logging;
use firebase_crm::pages::clients::ClientsPage;
use firebase_crm::pages::login::LoginForm;
use firebase_crm::pages::register::RegisterForm;
use firebase_crm::pages::{Notifier, Toast, ToastKind};
use firebase_crm::router::{resolve, Resolution, Route};
use firebase_crm::CrmApp;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "crm", about = "Gerenciador de clientes (Firebase)")]
struct Cli {
    /// Firebase config object (JSON). Defaults to FIREBASE_* environment variables.
    #[arg(long, env = "CRM_FIREBASE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CRM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CRM_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage clients
    #[command(subcommand)]
    Clients(ClientsCommand),
}

#[derive(Subcommand)]
enum ClientsCommand {
    /// List clients, optionally filtered
    List {
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Add a client
    Add(ClientFields),
    /// Edit a client; omitted fields keep their value
    Edit {
        id: String,
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Delete a client
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Args)]
struct ClientFields {
    #[arg(long)]
    nome: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    telefone: Option<String>,
    #[arg(long)]
    endereco: Option<String>,
}

struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => println!("✔ {}", toast.message),
            ToastKind::Error => eprintln!("✖ {}", toast.message),
        }
    }
}

fn status(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Runs the route guard for `route`. Prints the redirect and returns `false`
/// when the visit is not allowed.
fn enter(route: Route, auth: &AuthProvider) -> bool {
    match resolve(route.path(), &auth.state()) {
        Resolution::Render(_) => true,
        Resolution::Redirect(target) => {
            eprintln!("Acesso negado a {}: faça login ({}).", route, target);
            false
        }
        Resolution::Loading => {
            eprintln!("Sessão ainda carregando.");
            false
        }
    }
}

fn confirm_delete(nome: &str) -> bool {
    print!("Tem certeza que deseja excluir {}? [s/N] ", nome);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "s" | "sim" | "y" | "yes")
}

fn print_card(id: &str, client: &firebase_crm::clients::Client) {
    println!("[{}] {}", id, client.nome);
    println!("    E-mail:   {}", client.email);
    println!("    Telefone: {}", client.telefone);
    println!("    Endereço: {}", client.endereco);
}

async fn run_clients<R: ClientRepository>(
    command: ClientsCommand,
    mut page: ClientsPage<R>,
    notifier: &TerminalNotifier,
) -> ExitCode {
    if !page.load(notifier).await {
        return ExitCode::FAILURE;
    }

    match command {
        ClientsCommand::List { search } => {
            page.set_search(search.unwrap_or_default());
            let visible = page.visible();
            if visible.is_empty() {
                println!("Nenhum cliente encontrado.");
            }
            for entry in visible {
                print_card(&entry.id, &entry.client);
            }
            ExitCode::SUCCESS
        }
        ClientsCommand::Add(fields) => {
            page.open_create();
            if let Some(editor) = page.editor_mut() {
                apply(fields, &mut editor.form);
            }
            status(page.save(notifier).await)
        }
        ClientsCommand::Edit { id, fields } => {
            if !page.open_edit(&id) {
                eprintln!("Cliente {} não encontrado.", id);
                return ExitCode::FAILURE;
            }
            if let Some(editor) = page.editor_mut() {
                apply(fields, &mut editor.form);
            }
            status(page.save(notifier).await)
        }
        ClientsCommand::Delete { id, yes } => {
            if !page.clients().iter().any(|e| e.id == id) {
                eprintln!("Cliente {} não encontrado.", id);
                return ExitCode::FAILURE;
            }
            let deleted = page
                .delete(&id, |client| yes || confirm_delete(&client.nome), notifier)
                .await;
            status(deleted)
        }
    }
}

/// Signing out while signed out succeeds. A session file kept from a failed
/// restore is removed all the same.
async fn logout<R: ClientRepository>(
    mut page: ClientsPage<R>,
    auth: &AuthProvider,
    notifier: &dyn Notifier,
) -> bool {
    if auth.current_user().is_some() {
        return page.logout(auth, notifier).await.is_some();
    }
    if let Err(e) = auth.sign_out().await {
        eprintln!("Erro ao remover a sessão salva: {}", e);
        return false;
    }
    println!("Nenhum usuário conectado.");
    true
}

fn apply(fields: ClientFields, form: &mut firebase_crm::clients::Client) {
    if let Some(nome) = fields.nome {
        form.nome = nome;
    }
    if let Some(email) = fields.email {
        form.email = email;
    }
    if let Some(telefone) = fields.telefone {
        form.telefone = telefone;
    }
    if let Some(endereco) = fields.endereco {
        form.endereco = endereco;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::from_env().context("loading configuration from environment")?,
    };
    let app = CrmApp::new(config);
    let auth = app.auth();
    auth.restore().await;

    let notifier = TerminalNotifier;

    let code = match cli.command {
        Command::Login { email, password } => {
            if !enter(Route::Login, &auth) {
                return Ok(ExitCode::FAILURE);
            }
            let form = LoginForm::new(email, password);
            status(form.submit(&auth, &notifier).await.is_some())
        }
        Command::Register {
            email,
            password,
            confirm_password,
        } => {
            if !enter(Route::Register, &auth) {
                return Ok(ExitCode::FAILURE);
            }
            let form = RegisterForm::new(email, password, confirm_password);
            status(form.submit(&auth, &notifier).await.is_some())
        }
        Command::Logout => status(logout(ClientsPage::new(app.clients()), &auth, &notifier).await),
        Command::Whoami => match auth.account().await.context("fetching account")? {
            Some(account) => {
                println!(
                    "{} ({}){}",
                    account.email.as_deref().unwrap_or("sem e-mail"),
                    account.local_id,
                    if account.email_verified { "" } else { " - e-mail não verificado" }
                );
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("Nenhum usuário conectado.");
                ExitCode::FAILURE
            }
        },
        Command::Clients(command) => {
            if !enter(Route::Clients, &auth) {
                return Ok(ExitCode::FAILURE);
            }
            run_clients(command, ClientsPage::new(app.clients()), &notifier).await
        }
    };

    Ok(code)
}
