#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the solar map application.
//!
//! Serves the analytics pipeline (report, chart series, heatmap layer and
//! CSV/PDF exports), the editorial content API backed by `SQLite`, the
//! admin session gate, and the static data directory that holds the
//! `GeoJSON` fallback files.

mod handlers;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use solar_map_ai::ContentGenerator;
use solar_map_auth::AdminSessions;
use solar_map_config::AppConfig;
use solar_map_editorial::{EditorialError, EditorialStore};

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Dataset, analysis and server configuration.
    pub config: AppConfig,
    /// Editorial content store.
    pub editorial: EditorialStore,
    /// Admin session registry.
    pub sessions: AdminSessions,
    /// LLM content generator, when a provider is configured.
    pub content: Option<ContentGenerator>,
}

impl AppState {
    /// Opens the editorial store and builds the admin gate from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorialError`] if the editorial database cannot be
    /// opened.
    pub async fn from_config(config: AppConfig) -> Result<Self, EditorialError> {
        log::info!(
            "Opening editorial database at {}...",
            config.editorial.db_path.display()
        );
        let editorial = EditorialStore::open(&config.editorial.db_path).await?;

        let sessions = AdminSessions::new(
            config.admin.password_hash.clone(),
            config.admin.session_hours,
        );

        let content = match ContentGenerator::from_env() {
            Ok(generator) => Some(generator),
            Err(e) => {
                log::warn!("Content generation disabled: {e}");
                None
            }
        };

        Ok(Self {
            config,
            editorial,
            sessions,
            content,
        })
    }
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/municipalities", web::get().to(handlers::list_municipalities))
            .route("/municipalities", web::post().to(handlers::upsert_municipality))
            .route(
                "/municipalities",
                web::delete().to(handlers::delete_municipality_by_query),
            )
            .route(
                "/municipalities/{name}",
                web::get().to(handlers::get_municipality),
            )
            .route(
                "/municipalities/{name}",
                web::delete().to(handlers::delete_municipality),
            )
            .route("/admin/login", web::post().to(handlers::admin_login))
            .route("/admin/logout", web::post().to(handlers::admin_logout))
            .route("/analytics", web::get().to(handlers::analytics))
            .route("/analytics/charts", web::get().to(handlers::charts))
            .route("/analytics/heatmap", web::get().to(handlers::heatmap))
            .route("/analytics/export.csv", web::get().to(handlers::export_csv))
            .route("/analytics/export.pdf", web::get().to(handlers::export_pdf))
            .route("/content/{name}", web::post().to(handlers::generate_content)),
    );
}

/// Starts the solar map API server.
///
/// Opens the editorial database, builds the admin gate and content
/// generator, and serves until shutdown. The caller provides the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the editorial database cannot be
/// opened, or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;
    let data_dir = config.server.data_dir.clone();

    let state = web::Data::new(
        AppState::from_config(config)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?,
    );

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve the GeoJSON dataset and its fallbacks
            .service(Files::new("/data", data_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
