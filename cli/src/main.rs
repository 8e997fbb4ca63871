use std::path::PathBuf;
use std::process::ExitCode;

use catalog_session::session::{login_failure_message, register_failure_message};
use catalog_session::{
    ApiError, AuthSession, CatalogApi, ClientConfig, ConfigError, ProductDraft, ProductFilter, ProductUpdate,
};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    LoginFailed(&'static str),
    #[error("{0}")]
    RegisterFailed(String),
    #[error("not logged in; run `catalog login` first")]
    NotLoggedIn,
    #[error("product {0} not found")]
    ProductNotFound(i64),
    #[error("output encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "catalog", about = "Product catalog client with a persisted login session")]
struct Cli {
    #[arg(long, env = "CATALOG_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "CATALOG_STATE_FILE", help = "File holding the persisted session token")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CATALOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in with it.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CATALOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted session token.
    Logout,
    /// Print the current user.
    Whoami,
    /// Print session state without failing when logged out.
    Status,
    /// Check backend health.
    Health,
    Products(ProductsCommand),
}

#[derive(Args, Debug)]
struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProductsSubcommand {
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        max_price: Option<Decimal>,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value_t = 0)]
        stock: u32,
        #[arg(long)]
        category: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long)]
        category: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Serialize)]
struct StatusReport<'a> {
    state: &'static str,
    authenticated: bool,
    username: Option<&'a str>,
    api_url: &'a str,
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: ignoring unreadable .env: {e}");
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::new(cli.api_url.as_deref(), cli.state_file)?;
    let mut session = AuthSession::connect(&config)?;
    let state = session.resolve().await;
    tracing::debug!(state = state.as_str(), "session resolved at startup");

    match cli.command {
        Command::Login { username, password } => {
            session
                .try_login(&username, &password)
                .await
                .map_err(|e| {
                    tracing::warn!(%username, error = %e, "login failed");
                    CliError::LoginFailed(login_failure_message(&e))
                })?;
            println!("logged in as {username}");
            Ok(())
        }
        Command::Register { username, email, password } => {
            session
                .try_register(&username, &email, &password)
                .await
                .map_err(|e| {
                    tracing::warn!(%username, error = %e, "registration failed");
                    CliError::RegisterFailed(register_failure_message(&e))
                })?;
            println!("registered and logged in as {username}");
            Ok(())
        }
        Command::Logout => {
            session.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let user = session.current_user().ok_or(CliError::NotLoggedIn)?;
            print_json(user)
        }
        Command::Status => print_json(&StatusReport {
            state: session.state().as_str(),
            authenticated: session.is_authenticated(),
            username: session.current_user().map(|u| u.username.as_str()),
            api_url: &config.api_url,
        }),
        Command::Health => {
            let catalog = CatalogApi::new(session.client().clone());
            print_json(&catalog.health().await?)
        }
        Command::Products(products) => run_products(&session, products).await,
    }
}

async fn run_products(session: &AuthSession, products: ProductsCommand) -> Result<(), CliError> {
    let catalog = CatalogApi::new(session.client().clone());
    match products.command {
        ProductsSubcommand::List { category, max_price } => {
            let list = catalog.list(&ProductFilter { category, max_price }).await?;
            print_json(&list)
        }
        ProductsSubcommand::Get { id } => {
            let product = catalog.get(id).await.map_err(|e| not_found_as(id, e))?;
            print_json(&product)
        }
        ProductsSubcommand::Create { name, description, price, stock, category } => {
            require_login(session)?;
            let draft = ProductDraft { name, description, price, stock_quantity: stock, category };
            print_json(&catalog.create(&draft).await?)
        }
        ProductsSubcommand::Update { id, name, description, price, stock, category } => {
            require_login(session)?;
            let patch = ProductUpdate { name, description, price, stock_quantity: stock, category };
            let product = catalog
                .update(id, &patch)
                .await
                .map_err(|e| not_found_as(id, e))?;
            print_json(&product)
        }
        ProductsSubcommand::Delete { id } => {
            require_login(session)?;
            catalog.delete(id).await.map_err(|e| not_found_as(id, e))?;
            println!("deleted product {id}");
            Ok(())
        }
    }
}

fn require_login(session: &AuthSession) -> Result<(), CliError> {
    if session.is_authenticated() { Ok(()) } else { Err(CliError::NotLoggedIn) }
}

fn not_found_as(id: i64, error: ApiError) -> CliError {
    if error.is_not_found() { CliError::ProductNotFound(id) } else { CliError::Api(error) }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
