//! Chirpy command line
//!
//! Runs one operation against the JSON store and prints the result as JSON.

use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chirpy::{
    auth::{ApiKeyValidator, AuthService, CredentialHasher, TokenService},
    config::{Args, Command},
    db::{DocumentStore, Repository, User},
};

/// User as shown to callers; the password hash stays inside the store
#[derive(Serialize)]
struct UserView {
    id: u64,
    email: String,
    is_premium: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_premium: user.is_premium,
        }
    }
}

#[derive(Serialize)]
struct LoginView {
    #[serde(flatten)]
    user: UserView,
    token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct TokenView {
    token: String,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    std::io::Write::write_all(&mut stdout, b"\n")?;
    Ok(())
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    let json_logs = args.json_logs;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chirpy={},info", log_level).into()),
        )
        .with(json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Without durable storage there is nothing safe to do
    let store = match DocumentStore::open(args.store_config()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open document store {:?}: {}", args.db_path, e);
            std::process::exit(1);
        }
    };
    info!("Using document store {:?}", store.path());

    let repo = Repository::new(store);
    let auth = AuthService::new(
        CredentialHasher::new(args.hasher_config())?,
        TokenService::new(args.token_config())?,
        ApiKeyValidator::new(args.auth.polka_api_key.clone()),
        repo.clone(),
    );

    run(args.command, &auth, &repo)
}

fn run(command: Command, auth: &AuthService, repo: &Repository) -> anyhow::Result<()> {
    match command {
        Command::Init => {
            info!("Store is ready");
        }
        Command::Signup { email, password } => {
            let user = auth.signup(&email, &password)?;
            print_json(&UserView::from(user))?;
        }
        Command::Login { email, password } => {
            let session = auth.login(&email, &password)?;
            print_json(&LoginView {
                user: session.user.into(),
                token: session.access_token,
                refresh_token: session.refresh_token,
            })?;
        }
        Command::UpdateUser {
            token,
            email,
            password,
        } => {
            let user = auth.update_credentials(&bearer(&token), &email, &password)?;
            print_json(&UserView::from(user))?;
        }
        Command::Users => {
            let mut users = repo.list_users()?;
            users.sort_by_key(|u| u.id);
            let views: Vec<UserView> = users.into_iter().map(UserView::from).collect();
            print_json(&views)?;
        }
        Command::Post { token, body } => {
            let author_id = auth.authenticate(&bearer(&token))?;
            let chirp = repo.create_chirp(&body, author_id)?;
            print_json(&chirp)?;
        }
        Command::Chirps => {
            let mut chirps = repo.list_chirps()?;
            chirps.sort_by_key(|c| c.id);
            print_json(&chirps)?;
        }
        Command::Chirp { id } => {
            print_json(&repo.get_chirp(id)?)?;
        }
        Command::Delete { token, id } => {
            let requester = auth.authenticate(&bearer(&token))?;
            repo.delete_chirp(id, requester)?;
        }
        Command::Refresh { token } => {
            let token = auth.refresh(&bearer(&token))?;
            print_json(&TokenView { token })?;
        }
        Command::Revoke { token } => {
            auth.revoke(&bearer(&token))?;
        }
        Command::Upgrade { api_key, user_id } => {
            auth.authorize_webhook(&format!("ApiKey {api_key}"))?;
            let user = repo.upgrade_user(user_id)?;
            print_json(&UserView::from(user))?;
        }
    }

    Ok(())
}
