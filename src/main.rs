use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use inventaris_client::api::error::ApiError;
use inventaris_client::api::types::{
    AuthRequest, Borrowing, BorrowingRequest, Category, Inventory, ListQuery, Location, Supplier,
};
use inventaris_client::config::{ClientConfig, ConfigError};
use inventaris_client::notify::{Notice, Notifier, Severity};
use inventaris_client::state::{AppState, InitError};
use inventaris_client::store::{auth, dashboard, global, resource, Resource};

#[derive(Parser, Debug)]
#[command(name = "inventaris", version, about = "Inventaris admin client")]
struct Cli {
    /// API base URL (overrides INVENTARIS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory for the token and persisted session (overrides INVENTARIS_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and keep the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "INVENTARIS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session and forget the stored token
    Logout,
    /// Show the current session
    Whoami,
    /// Aggregate statistics
    Dashboard,
    /// Sidebar menus for the current role
    Menus,
    /// CRUD permissions for one menu
    Permission { menu: String },
    /// Look up an item (and its borrowings) by scanned barcode id
    Barcode { id: u64 },
    /// Submit the public equipment-borrowing request form
    BorrowRequest {
        /// JSON body file, or '-' for stdin
        #[arg(long)]
        json: String,
    },
    Categories {
        #[command(subcommand)]
        op: ResourceCommand,
    },
    Locations {
        #[command(subcommand)]
        op: ResourceCommand,
    },
    Suppliers {
        #[command(subcommand)]
        op: ResourceCommand,
    },
    Inventories {
        #[command(subcommand)]
        op: ResourceCommand,
    },
    Borrowings {
        #[command(subcommand)]
        op: ResourceCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ResourceCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    Show {
        id: u64,
    },
    Create {
        /// JSON body file, or '-' for stdin
        #[arg(long)]
        json: String,
    },
    Update {
        id: u64,
        /// JSON body file, or '-' for stdin
        #[arg(long)]
        json: String,
    },
    Delete {
        id: u64,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not logged in")]
    NotLoggedIn,
}

/// Presents notices on stderr, the terminal's stand-in for dialogs.
#[derive(Default)]
struct ConsoleNotifier {
    shown: AtomicBool,
}

impl ConsoleNotifier {
    /// Whether any notice reached the terminal.
    fn shown(&self) -> bool {
        self.shown.load(Ordering::SeqCst)
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        self.shown.store(true, Ordering::SeqCst);
        match notice.severity {
            Severity::Fatal => eprintln!("error: {}: {}", notice.title, notice.content),
            Severity::Warning => eprintln!("warning: {}: {}", notice.title, notice.content),
            Severity::Transient => eprintln!("{}", notice.content),
        }
    }

    fn redirect(&self, path: &str) {
        log::debug!("redirect to {}", path);
        eprintln!("Session ended. Run `inventaris login` to sign in again.");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let cli = Cli::parse();
    let notifier = Arc::new(ConsoleNotifier::default());
    match run(cli, notifier.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("command failed: {:?}", e);
            if needs_report(&e, &notifier) {
                eprintln!("error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

/// API failures the notifier already printed are not repeated.
fn needs_report(err: &CliError, notifier: &ConsoleNotifier) -> bool {
    !(matches!(err, CliError::Api(_)) && notifier.shown())
}

async fn run(cli: Cli, notifier: Arc<ConsoleNotifier>) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let app = AppState::bootstrap(&config, notifier)?;
    log::info!("Using API at {}", app.api.base_url());

    match cli.command {
        Command::Login { username, password } => {
            let resp = auth::login(&app, &AuthRequest { username, password }).await?;
            println!("Logged in as {}", resp.role);
        }
        Command::Logout => {
            auth::logout(&app).await;
            println!("Logged out");
        }
        Command::Whoami => {
            let auth = app.store.select(|s| s.auth.clone());
            match auth.user {
                Some(user) if auth.token.is_some() => print_json(&user)?,
                _ => return Err(CliError::NotLoggedIn),
            }
        }
        Command::Dashboard => print_json(&dashboard::fetch(&app).await?)?,
        Command::Menus => print_json(&global::fetch_menus(&app).await?)?,
        Command::Permission { menu } => print_json(&global::fetch_permission(&app, &menu).await?)?,
        Command::Barcode { id } => print_json(&global::inventory_by_barcode(&app, id).await?)?,
        Command::BorrowRequest { json } => {
            let payload: BorrowingRequest = read_json(&json)?;
            let env = global::create_borrowing_request(&app, &payload).await?;
            match env.data {
                Some(receipt) => println!(
                    "Request submitted ({}): {}",
                    env.meta.code, receipt.kode_peminjaman
                ),
                None => println!("Request submitted ({}): {}", env.meta.code, env.meta.message),
            }
        }
        Command::Categories { op } => run_resource::<Category>(&app, op).await?,
        Command::Locations { op } => run_resource::<Location>(&app, op).await?,
        Command::Suppliers { op } => run_resource::<Supplier>(&app, op).await?,
        Command::Inventories { op } => run_resource::<Inventory>(&app, op).await?,
        Command::Borrowings { op } => run_resource::<Borrowing>(&app, op).await?,
    }
    Ok(())
}

async fn run_resource<R>(app: &AppState, op: ResourceCommand) -> Result<(), CliError>
where
    R: Resource,
    R::Request: DeserializeOwned,
{
    match op {
        ResourceCommand::List {
            search,
            page,
            limit,
        } => {
            resource::fetch_list::<R>(app, &ListQuery::new(search, limit, page)).await?;
            let (list, pagination) = app
                .store
                .select(|s| (R::slice(s).list.clone(), R::slice(s).pagination.clone()));
            print_json(&serde_json::json!({ "page_data": list, "page_info": pagination }))?;
        }
        ResourceCommand::Show { id } => print_json(&resource::fetch_one::<R>(app, id).await?)?,
        ResourceCommand::Create { json } => {
            let payload: R::Request = read_json(&json)?;
            let env = resource::create::<R>(app, &payload).await?;
            println!("{} ({})", env.meta.message, env.meta.code);
        }
        ResourceCommand::Update { id, json } => {
            let payload: R::Request = read_json(&json)?;
            let env = resource::update::<R>(app, id, &payload).await?;
            println!("{} ({})", env.meta.message, env.meta.code);
        }
        ResourceCommand::Delete { id } => {
            let env = resource::destroy::<R>(app, id).await?;
            println!("{} ({})", env.meta.message, env.meta.code);
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(source: &str) -> Result<T, CliError> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
