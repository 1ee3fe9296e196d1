use std::sync::Arc;

use campus_session::config::ConfigError;
use campus_session::net::api;
use campus_session::net::types::RegisterRequest;
use campus_session::{
    AccessDecision, Authenticator, BackendAuthenticator, DemoAuthenticator, FileStorage, RequestClient,
    RequestError, SessionConfig, SessionManager, SessionStorage, decide, should_defer,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("request failed ({}): {}", .0.status, .0.message)]
    Request(#[from] RequestError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("login required; continue at {0}")]
    LoginRequired(String),
    #[error("not signed in")]
    NotSignedIn,
}

#[derive(Parser, Debug)]
#[command(name = "campus", about = "Campus Connect session CLI")]
struct Cli {
    #[arg(long, env = "CAMPUS_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "CAMPUS_SESSION_DIR")]
    session_dir: Option<String>,

    /// Sign in offline with the demo authenticator instead of the backend.
    #[arg(long, env = "CAMPUS_DEMO", default_value_t = false)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register(RegisterArgs),
    Logout,
    Whoami,
    /// Ask the access gate whether a route may be shown.
    Check {
        path: String,
    },
    Health,
    Api(ApiArgs),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
}

#[derive(Args, Debug)]
struct ApiArgs {
    #[arg(value_enum)]
    method: HttpVerb,
    path: String,
    #[arg(long, help = "JSON request body")]
    data: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    fn method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = SessionConfig::from_parts(cli.api_url.as_deref(), cli.session_dir.as_deref())?;
    let session = build_session(&config, cli.demo);
    let restored = session.restore();
    tracing::debug!(authenticated = restored.user().is_some(), "session restored");

    match cli.command {
        Command::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            tracing::info!(user_id = %user.id, role = user.role.as_str(), "signed in");
            print_json(&serde_json::to_value(&user)?)
        }
        Command::Register(args) => run_register(&session, args).await,
        Command::Logout => {
            session.logout();
            tracing::info!("signed out");
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let snapshot = session.snapshot();
            let user = snapshot.user.ok_or(CliError::NotSignedIn)?;
            print_json(&serde_json::to_value(&user)?)
        }
        Command::Check { path } => run_check(&session, &path),
        Command::Health => print_json(&api::health(session.client()).await?),
        Command::Api(args) => run_api(&session, args).await,
    }
}

/// Construct storage, client and session once; everything else borrows them.
fn build_session(config: &SessionConfig, demo: bool) -> SessionManager {
    let files = FileStorage::new(&config.session_dir);
    tracing::debug!(api_url = %config.api_url, session_dir = %files.root().display(), demo, "session configured");
    let storage: Arc<dyn SessionStorage> = Arc::new(files);
    let client = RequestClient::new(&config.api_url, storage);
    let authenticator: Arc<dyn Authenticator> = if demo {
        Arc::new(DemoAuthenticator)
    } else {
        Arc::new(BackendAuthenticator::new(client.clone()))
    };
    SessionManager::new(client, authenticator)
}

async fn run_register(session: &SessionManager, args: RegisterArgs) -> Result<(), CliError> {
    let request = RegisterRequest {
        username: args.username,
        email: args.email,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
    };
    let user = session.register(&request).await?;
    tracing::info!(user_id = %user.id, "account created");
    print_json(&serde_json::to_value(&user)?)
}

fn run_check(session: &SessionManager, path: &str) -> Result<(), CliError> {
    let snapshot = session.snapshot();
    if should_defer(&snapshot) {
        println!("pending");
        return Ok(());
    }
    let decision = decide(&snapshot, path);
    tracing::debug!(path, ?decision, "access decision");
    match decision.login_location() {
        None => {
            println!("{}", render_decision(&decision));
            Ok(())
        }
        Some(location) => Err(CliError::LoginRequired(location)),
    }
}

fn render_decision(decision: &AccessDecision) -> String {
    match decision {
        AccessDecision::Allow => "allow".to_owned(),
        AccessDecision::RedirectToLogin { return_path } => format!("redirect to login (return to {return_path})"),
    }
}

async fn run_api(session: &SessionManager, args: ApiArgs) -> Result<(), CliError> {
    let body = parse_data(args.data.as_deref())?;
    let method = args.method.method();
    let path = normalize_path(&args.path);
    tracing::debug!(%method, path = %path, has_body = body.is_some(), "api call");
    let value = session.client().send(method, &path, body.as_ref()).await?;
    print_json(&value)
}

fn parse_data(raw: Option<&str>) -> Result<Option<Value>, CliError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Ok(Some(serde_json::from_str(text)?)),
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') { path.to_owned() } else { format!("/{path}") }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
