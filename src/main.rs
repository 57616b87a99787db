mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod utils;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use tokio::sync::Notify;

use crate::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|err| {
        error!("{}", err);
        std::io::Error::other(err)
    })?;

    // One session for the lifetime of the process
    let pool = db::init_database(&config).await.map_err(|err| {
        error!("Error - Initialize database: {}", err);
        std::io::Error::other(err)
    })?;

    let exit_signal = web::Data::new(Notify::new());
    let app_config = web::Data::new(config.clone());
    let app_pool = web::Data::new(pool.clone());

    info!("Starting server at {}", config.bind_address);

    let server = HttpServer::new({
        let exit_signal = exit_signal.clone();
        move || {
            App::new()
                .app_data(app_pool.clone())
                .app_data(app_config.clone())
                .app_data(exit_signal.clone())
                .configure(handlers::configure)
        }
    })
    .workers(1)
    .bind(&config.bind_address)?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        exit_signal.notified().await;
        handle.stop(true).await;
    });

    server.await?;

    pool.close().await;
    info!("Database closed");
    Ok(())
}
