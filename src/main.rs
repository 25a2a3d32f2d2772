mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{dev::Service as _, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::AppConfig;
use services::{llm::ProviderChain, web_search::WebSearch};

/// Maintenance commands accepted as the first CLI argument.
enum Command {
    Serve,
    Seed,
    SeedAdmin,
    DeleteAdmin,
}

impl Command {
    fn from_args() -> Result<Self, String> {
        match std::env::args().nth(1).as_deref() {
            None | Some("serve") => Ok(Command::Serve),
            Some("seed") => Ok(Command::Seed),
            Some("seed-admin") => Ok(Command::SeedAdmin),
            Some("delete-admin") => Ok(Command::DeleteAdmin),
            Some(other) => Err(format!(
                "Unknown command '{}'. Expected one of: serve, seed, seed-admin, delete-admin",
                other
            )),
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let command = match Command::from_args() {
        Ok(command) => command,
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(2);
        }
    };

    let config = AppConfig::from_env();

    let db = match database::MongoDB::new(&config.mongodb_uri).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };

    let maintenance = match command {
        Command::Serve => None,
        Command::Seed => Some(seeds::seed_catalog(&db).await),
        Command::SeedAdmin => Some(seeds::seed_admin(&db).await.map(|_| ())),
        Command::DeleteAdmin => Some(seeds::delete_admin(&db).await.map(|_| ())),
    };
    if let Some(result) = maintenance {
        if let Err(e) = result {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    log::info!("🚀 Starting Civic Portal Service...");
    config.log_integrations();

    let db_data = web::Data::new(db);
    let llm_data = web::Data::new(ProviderChain::from_config(&config));
    let search_data = web::Data::new(WebSearch::from_config(&config));
    let config_data = web::Data::new(config.clone());

    log::info!("📅 Starting background jobs...");
    let _refresh_jobs = jobs::market_refresh::start_market_refresh(config.clone());
    log::info!("✅ Background jobs started");

    let host = config.host.clone();
    let port = config.port.clone();
    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI document at: http://{}:{}/api-docs/openapi.json", host, port);

    let cors_origins = config.cors_origins.clone();

    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(llm_data.clone())
            .app_data(search_data.clone())
            .app_data(config_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .wrap_fn(|req, srv| {
                api::metrics::increment_request_count();
                srv.call(req)
            })
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi),
            )
            .route("/health", web::get().to(api::health::health_check))
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            .configure(api::configure)
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
