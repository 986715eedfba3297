use anyhow::Result;
use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use cookie::Key;
use oso::Oso;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::actions::try_register_oso;
use crate::config::{AdminSeed, Config, MEMORY_DATABASE};
use crate::handlers::{accounts, category, poi};
use crate::images::{Cloudinary, ImageStore};
use crate::models::User;
use crate::store::{MemoryStore, SeaOrmStore, Store};
use crate::utils::pass::hash_password;
use crate::views::Views;

pub struct State {
    pub(crate) oso: Arc<Mutex<Oso>>,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) images: ImageStore,
    pub(crate) views: Views,
    pub(crate) session_key: Key,
    pub(crate) secure_cookies: bool,
}

impl State {
    /// Attempt to create a new State instance around an already opened store.
    pub fn try_new(
        store: Arc<dyn Store>,
        images: ImageStore,
        session_key: Key,
        secure_cookies: bool,
    ) -> Result<State> {
        let oso = Arc::new(Mutex::new(try_register_oso()?));
        let views = Views::try_new()?;

        Ok(State {
            oso,
            store,
            images,
            views,
            session_key,
            secure_cookies,
        })
    }

    /// Open the configured store and image host, then build the State.
    pub async fn from_config(config: &Config) -> Result<State> {
        let store: Arc<dyn Store> = if config.database_url == MEMORY_DATABASE {
            tracing::warn!("Using the in-memory store, nothing will survive a restart");
            Arc::new(MemoryStore::new())
        } else {
            let store = SeaOrmStore::connect(&config.database_url).await?;
            store.ensure_schema().await?;
            Arc::new(store)
        };

        if let Some(seed) = &config.admin {
            seed_admin(store.as_ref(), seed).await?;
        }

        let host = Arc::new(Cloudinary::new(config.cloudinary.clone()));
        let images = ImageStore::new(host, &config.upload_dir);

        // length is checked when the config is read
        let session_key = Key::from(config.session_secret.as_bytes());

        State::try_new(store, images, session_key, config.secure_cookies)
    }
}

/// Create the configured admin account unless its email is already registered.
async fn seed_admin(store: &dyn Store, seed: &AdminSeed) -> Result<()> {
    if store.user_by_email(&seed.email).await?.is_some() {
        return Ok(());
    }

    let mut admin = User::new("Admin", "User", &seed.email, hash_password(&seed.password)?);
    admin.is_admin = true;
    store.insert_user(&admin).await?;

    tracing::info!("Created admin account {}", admin.email);
    Ok(())
}

/// Every route of the application, with `state` available to handlers and extractors.
pub fn router(state: Arc<State>) -> Router {
    Router::new()
        .route("/", get(accounts::landing))
        .route("/signup", get(accounts::show_signup).post(accounts::signup))
        .route("/login", get(accounts::show_login).post(accounts::login))
        .route("/logout", get(accounts::logout))
        .route(
            "/settings",
            get(accounts::show_settings).post(accounts::update_settings),
        )
        .route("/settings/delete", post(accounts::delete_account))
        .route("/home", get(poi::home))
        .route("/report", get(poi::report))
        .route("/addpoi", post(poi::create))
        .route("/poi/:id", get(poi::show).post(poi::update))
        .route("/poi/:id/edit", get(poi::edit))
        .route("/poi/:id/delete", post(poi::delete))
        .route("/poi/:id/image", post(poi::add_image))
        .route("/category", post(category::create))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

/// Run the server.
pub async fn run(config: Config) -> Result<()> {
    let state = Arc::new(State::from_config(&config).await?);
    let app = router(state);

    tracing::info!("Listening on {}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install the terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
