pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use domain::ports::{CatalogStore, OrderRepository, SessionResolver};
use infrastructure::catalog_repo::DieselCatalogStore;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::session_repo::DieselSessionResolver;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type MigrationError = Box<dyn std::error::Error + Send + Sync>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("applied {} pending migration(s)", applied.len());
    Ok(())
}

pub type SharedOrderService = OrderService<Arc<dyn OrderRepository>, Arc<dyn CatalogStore>>;

/// Everything the HTTP handlers need, shared across workers.
pub struct AppState {
    pub orders: SharedOrderService,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogStore>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        Self {
            orders: OrderService::new(repo, catalog),
            sessions,
        }
    }

    /// Wires the Postgres-backed adapters onto one pool.
    pub fn with_pool(pool: DbPool) -> Self {
        Self::new(
            Arc::new(DieselOrderRepository::new(pool.clone())),
            Arc::new(DieselCatalogStore::new(pool.clone())),
            Arc::new(DieselSessionResolver::new(pool)),
        )
    }
}

/// Registers the order routes. Shared by [`build_server`] and the HTTP tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/establishments/{establishment_id}/orders")
            .app_data(web::JsonConfig::default().error_handler(errors::json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(errors::query_error_handler))
            .route("", web::post().to(handlers::orders::create_order))
            .route("", web::get().to(handlers::orders::list_orders))
            .route("/{order_id}", web::get().to(handlers::orders::get_order))
            .route(
                "/{order_id}/status",
                web::patch().to(handlers::orders::transition_status),
            ),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = handlers::ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
