//! # Blog Server
//!
//! Entry point: serves the blog over HTTP, or manages accounts.

use actix_web::{App, HttpServer, web};
use clap::{Parser, Subcommand};
use tracing_actix_web::TracingLogger;

mod accounts;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::rate_limit::RateLimitMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[derive(Debug, Parser)]
#[command(name = "blog-server")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Create a login account
    CreateUser {
        username: String,
        #[arg(env = "BLOG_NEW_USER_PASSWORD")]
        password: String,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateUser { username, password } => {
            if config.database.is_none() {
                tracing::warn!("DATABASE_URL not set; the account will not outlive this process");
            }
            let state = AppState::new(&config).await;
            accounts::create_user(&state, &username, &password).await?;
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting blog server on {}:{}", config.host, config.port);

    let state = AppState::new(&config).await;

    if let Some((username, password)) = &config.admin {
        accounts::ensure_user(&state, username, password).await?;
    }

    let comment_throttle =
        RateLimitMiddleware::new(state.comment_limiter.clone(), state.trust_forwarded_for);

    HttpServer::new(move || {
        let comment_throttle = comment_throttle.clone();
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| handlers::configure_routes(cfg, comment_throttle))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
