pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

use std::error::Error;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::cart_service::CartService;
use application::order_service::OrderService;
use application::payment_service::PaymentService;
use config::AppConfig;
use infrastructure::cart_repo::DieselCartRepository;
use infrastructure::catalog_repo::{DieselOfferRepository, DieselProductRepository};
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::transaction_repo::DieselTransactionRepository;
use openapi::ApiDoc;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Build and return an actix-web `Server` bound to the configured address.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(pool: DbPool, config: &AppConfig) -> std::io::Result<actix_web::dev::Server> {
    let carts = DieselCartRepository::new(pool.clone());
    let products = DieselProductRepository::new(pool.clone());
    let offers = DieselOfferRepository::new(pool.clone());
    let orders = DieselOrderRepository::new(pool.clone());
    let transactions = DieselTransactionRepository::new(pool);

    let cart_service = web::Data::new(CartService::new(
        carts.clone(),
        products,
        offers.clone(),
    ));
    let order_service = web::Data::new(OrderService::new(
        carts,
        offers,
        orders.clone(),
        config.orders,
    ));
    let payment_service = web::Data::new(PaymentService::new(
        orders,
        transactions,
        config.payment.clone(),
    ));

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(cart_service.clone())
            .app_data(order_service.clone())
            .app_data(payment_service.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/cart")
                    .route("", web::post().to(handlers::cart::add_to_cart))
                    .route("", web::get().to(handlers::cart::get_cart))
                    .route("/checkout", web::post().to(handlers::cart::checkout))
                    .route("/{cart_id}", web::put().to(handlers::cart::update_cart))
                    .route("/{cart_id}", web::delete().to(handlers::cart::remove_from_cart)),
            )
            .service(
                web::scope("/order")
                    .route("", web::post().to(handlers::orders::place_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order)),
            )
            .route(
                "/admin/order/{id}/status",
                web::put().to(handlers::orders::update_order_status),
            )
            .service(
                web::scope("/payment")
                    .route("/qr", web::post().to(handlers::payments::create_qr))
                    .route("/webhook", web::post().to(handlers::payments::webhook)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
