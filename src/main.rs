use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use devtasks::auth::extractors::CSRF_HEADER;
use devtasks::config::Config;
use devtasks::routes;
use devtasks::store::PgStore;
use devtasks::{AppContext, ContextSettings};

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;

    let store = PgStore::connect(&config).await.map_err(startup_error)?;
    store.migrate().await.map_err(startup_error)?;
    log::info!("database ready, migrations applied");

    let ctx = web::Data::new(AppContext::new(
        Arc::new(store),
        ContextSettings::from(&config),
    ));

    log::info!("Starting DevTasks server at {}", config.server_url());
    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .allowed_header(CSRF_HEADER)
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(ctx.clone())
            .service(routes::health::health)
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .shutdown_timeout(5)
    .run()
    .await
}
