//! The messenger of the gods.
//!
//! Iris relays webhook notifications from external services (Docker Hub,
//! Heroku) to a Slack incoming webhook.

use config::Config;
use dotenvy::dotenv;
use router::Deps;
use std::sync::Arc;
use std::{env, net::SocketAddr};
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;
use tracing::{info, warn};

mod config;
mod docker_hub;
mod error;
mod heroku;
mod router;
mod slack;

/// Application entrypoint. Initialises tracing, checks for environment
/// variables, binds to 0.0.0.0, and starts the server.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let has_dotenv = dotenv().is_ok();
    if !has_dotenv {
        warn!("No .env found");
    }

    let port: u16 = env::var("PORT")
        .map(|x| x.parse().expect("Could not parse PORT to u16"))
        .unwrap_or(80);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    // Our hosts send SIGTERM ahead of killing the process; exiting promptly
    // with the conventional code keeps dyno shutdowns fast.
    //
    // <https://devcenter.heroku.com/articles/dynos#shutdown>
    tokio::spawn(async {
        let kind = SignalKind::terminate();
        let mut sigterm = signal(kind).expect("Could not install SIGTERM handler");
        sigterm.recv().await;
        std::process::exit(128 + kind.as_raw_value());
    });

    server_(addr).await;
}

/// Initialise a server without graceful shutdown.
async fn server_(addr: SocketAddr) {
    // Giving a receiver that will never resolve.
    server(addr, oneshot::channel::<()>().1).await;
}

/// Initialise a server with graceful shutdown via `rx`.
async fn server(addr: SocketAddr, rx: oneshot::Receiver<()>) {
    info!("Listening on {}", addr.to_string());

    let config = Config::from_env();
    if config.targets.default.is_none() {
        warn!("No $SLACK_WEBHOOK_URL environment variable found");
    }
    if config.heroku_secret.is_none() {
        warn!("No $HEROKU_WEBHOOK_SECRET environment variable found");
    }

    let deps = Deps {
        config: Arc::new(config),
        http: reqwest::Client::new(),
    };

    let listener = TcpListener::bind(addr).await.expect("Failed to bind address");

    axum::serve(listener, router::new(deps))
        .with_graceful_shutdown(async {
            rx.await.ok();
        })
        .await
        .expect("Failed to start server");
}
