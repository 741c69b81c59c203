use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tweeter_app::command::{Command, HELP};
use tweeter_app::telemetry::{self, LogFormat};
use tweeter_app::App;
use tweeter_backend::{AuthApi, InMemoryBackend, PostsApi, RestBackend};
use tweeter_common::Config;
use tweeter_feed::FeedSnapshot;
use tweeter_session::{FileStore, KeyValueStore};

const OFFLINE_EMAIL: &str = "demo@example.com";
const OFFLINE_PASSWORD: &str = "demo";

fn build_backend(config: &Config) -> Result<(Arc<dyn PostsApi>, Arc<dyn AuthApi>)> {
    if config.backend.offline {
        let email = config.session.email.as_deref().unwrap_or(OFFLINE_EMAIL);
        let password = config.session.password.as_deref().unwrap_or(OFFLINE_PASSWORD);
        info!(email = %email, "Running against the in-memory backend");

        let backend = Arc::new(InMemoryBackend::new().with_account(email, password));
        let posts: Arc<dyn PostsApi> = backend.clone();
        return Ok((posts, backend));
    }

    let backend = Arc::new(
        RestBackend::new(&config.backend).context("Failed to build backend client")?,
    );
    info!(url = %config.backend.url, table = %config.backend.posts_table, "Backend client ready");
    let posts: Arc<dyn PostsApi> = backend.clone();
    Ok((posts, backend))
}

fn print_screen(app: &App) {
    println!("{}", app.screen());
}

/// Resolves on the next feed transition; never resolves without a feed
async fn feed_changed(updates: &mut Option<watch::Receiver<FeedSnapshot>>) {
    if let Some(rx) = updates.as_mut() {
        if rx.changed().await.is_ok() {
            return;
        }
    }
    // Store gone; wait for the next command to resubscribe
    *updates = None;
    std::future::pending::<()>().await
}

/// Returns `false` when the user asked to quit
async fn dispatch(app: &mut App, command: Command) -> bool {
    match command {
        Command::Go(path) => {
            app.navigate(&path).await;
        }
        Command::Login { email, password } => {
            if let Err(e) = app.login(&email, &password).await {
                println!("Sign-in failed: {}", e);
            }
        }
        Command::Logout => {
            app.logout().await;
        }
        Command::Post(content) => {
            // Progress and failures reach the screen through feed updates
            if let Err(e) = app.spawn_post(&content) {
                println!("Could not post: {}", e);
            }
        }
        Command::Refresh => {
            if let Err(e) = app.refresh().await {
                warn!(error = %e, "Refresh failed");
            }
        }
        Command::Rename(name) => {
            if let Err(e) = app.rename(&name) {
                println!("Could not change name: {}", e);
            }
        }
        Command::Dismiss => app.dismiss_error(),
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing(LogFormat::from_env());

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration loading failed: {}", e);
            return Err(e).context("Configuration loading failed");
        }
    };

    let (posts, auth) = build_backend(&config)?;
    let storage: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.session.storage_path).context("Failed to open local storage")?,
    );

    let credentials = config.session.email.clone().zip(config.session.password.clone());
    let mut app = App::new(config, posts, auth, storage);

    if let Some((email, password)) = credentials {
        if let Err(e) = app.login(&email, &password).await {
            warn!(error = %e, "Automatic sign-in failed");
        }
    }
    app.navigate("/").await;
    print_screen(&app);
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = app.feed_updates();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
            _ = feed_changed(&mut updates) => {
                print_screen(&app);
                continue;
            }
        };
        let Some(line) = line else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if !dispatch(&mut app, command).await {
            break;
        }
        app.sync_session().await;
        updates = app.feed_updates();
        print_screen(&app);
    }

    app.shutdown();
    info!("Bye");
    Ok(())
}
