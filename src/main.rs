//! Travelhub Backend
//!
//! REST backend for tour bookings, travel diaries and the community feed,
//! with a SQLite document store, Tantivy tour search and local blob storage.

mod api;
mod auth;
mod config;
mod db;
mod documents;
mod errors;
mod integrations;
mod models;
mod search;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::DocumentStore;
use integrations::Integrations;
use models::Tour;
use search::SearchIndex;
use storage::{BlobStore, FILES_ROUTE};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub blobs: Arc<BlobStore>,
    pub search: Arc<SearchIndex>,
    pub integrations: Arc<Integrations>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Travelhub Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Upload directory: {:?}", config.upload_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (TRAVELHUB_API_PSK). Authentication is disabled!");
    }
    if config.admin_ids.is_empty() {
        tracing::info!("No bootstrap admins configured (TRAVELHUB_ADMIN_IDS)");
    }

    // Initialize storage
    let pool = db::init_database(&config.db_path).await?;
    let store = Arc::new(DocumentStore::new(pool));
    let blobs = Arc::new(BlobStore::open(&config.upload_dir, &config.public_url).await?);

    // Build the tour search index from the stored tours
    let search = Arc::new(SearchIndex::open(&config.index_path)?);
    let tours = store.list::<Tour>().await?;
    search.rebuild(&tours).await?;
    tracing::info!("Search index built with {} tours", tours.len());

    let integrations = Arc::new(Integrations::new(config.integrations.clone())?);

    let state = AppState {
        store,
        blobs,
        search,
        integrations,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();
    let body_limit = state.config.max_upload_bytes;

    let api_routes = Router::new()
        // Session
        .route("/session", get(api::get_session))
        .route("/profile", get(api::get_profile).put(api::update_profile))
        .route("/admin/users/{id}/role", put(api::update_user_role))
        // Tours
        .route("/tours", get(api::list_tours).post(api::create_tour))
        .route(
            "/tours/{id}",
            get(api::get_tour)
                .put(api::update_tour)
                .delete(api::delete_tour),
        )
        .route("/tours/{id}/gallery", post(api::upload_gallery_images))
        .route(
            "/tours/{id}/gallery/{index}",
            delete(api::delete_gallery_image),
        )
        // Bookings
        .route(
            "/bookings",
            get(api::list_my_bookings).post(api::create_booking),
        )
        .route("/bookings/all", get(api::list_all_bookings))
        .route(
            "/bookings/{id}",
            get(api::get_booking)
                .put(api::update_booking)
                .delete(api::delete_booking),
        )
        .route("/bookings/{id}/status", put(api::update_booking_status))
        .route(
            "/bookings/{id}/confirmation.pdf",
            get(api::booking_confirmation_pdf),
        )
        // Todos
        .route("/todos", get(api::list_todos).post(api::create_todo))
        .route(
            "/todos/{id}",
            put(api::update_todo).delete(api::delete_todo),
        )
        .route("/todos/{id}/toggle", post(api::toggle_todo))
        // Diaries
        .route("/diaries", get(api::list_diaries).post(api::create_diary))
        .route(
            "/diaries/{id}",
            get(api::get_diary).delete(api::delete_diary),
        )
        .route("/diaries/{id}/share", post(api::share_diary))
        // Feed
        .route("/posts", get(api::list_posts).post(api::create_post))
        .route(
            "/posts/{id}",
            get(api::get_post)
                .put(api::update_post)
                .delete(api::delete_post),
        )
        .route("/posts/{id}/like", post(api::toggle_like))
        .route("/posts/{id}/comments", post(api::add_comment))
        .route(
            "/posts/{id}/comments/{comment_id}",
            put(api::update_comment).delete(api::delete_comment),
        )
        .route(
            "/posts/{id}/comments/{comment_id}/replies",
            post(api::add_reply),
        )
        .route(
            "/posts/{id}/comments/{comment_id}/replies/{reply_id}",
            delete(api::delete_reply),
        )
        // Dashboard widgets
        .route("/integrations/weather", get(api::weather))
        .route("/integrations/translate", post(api::translate))
        .route("/integrations/flights/{flight}", get(api::flight_status))
        .route("/integrations/currency", get(api::currency))
        .layer(DefaultBodyLimit::max(body_limit))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check and uploaded files (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .nest_service(FILES_ROUTE, ServeDir::new(state.blobs.root()));

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
