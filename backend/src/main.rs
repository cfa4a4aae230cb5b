mod config;
mod error;
mod services;
mod storage;
mod table_locks;

use crate::config::AppConfig;
use crate::storage::Store;
use crate::table_locks::state::TableLocks;
use actix_web::{web, App, HttpResponse, HttpServer};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::parse();

    let store = Store::open(&config.database_path).map_err(|e| {
        error!("cannot open {}: {}", config.database_path.display(), e);
        std::io::Error::other(e.to_string())
    })?;
    info!("using database {}", store.path().display());

    // Shared across workers so imports into one table are serialized server-wide.
    let locks = TableLocks::new();

    let bind = (config.host.clone(), config.port);
    info!("Server running at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(config.max_upload_bytes))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(locks.clone()))
            .app_data(web::Data::new(config.clone()))
            .service(services::configure_routes())
            .default_service(web::route().to(HttpResponse::NotFound))
    })
    .bind(bind)?
    .run()
    .await
}
