use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use fraud_api::{
    config::Config, database, handlers, metrics, middleware::TokenIssuer,
    model_client::ModelServiceClient, validation, AnalysisRepository, PgRepository,
    UserRepository,
};
use prometheus::Registry;
use risk_engine::RiskScorer;
use std::io::{Error, ErrorKind};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting fraud API...");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        Error::new(ErrorKind::Other, e.to_string())
    })?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        Error::new(ErrorKind::InvalidInput, e)
    })?;
    let threshold = config
        .threshold()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, e))?;
    info!("Configuration loaded successfully");

    // Create database pool
    let pool = match database::create_pool(&config.database).await {
        Ok(p) => {
            info!("Database connection pool created successfully");
            p
        }
        Err(e) => {
            error!("Failed to create database pool: {}", e);
            return Err(Error::new(
                ErrorKind::Other,
                format!("Database connection failed: {}", e),
            ));
        }
    };

    if let Err(e) = database::health_check(&pool).await {
        error!("Database health check failed: {}", e);
        return Err(Error::new(ErrorKind::Other, "Database not accessible"));
    }

    if let Err(e) = database::ensure_schema(&pool).await {
        error!("Failed to create schema: {}", e);
        return Err(Error::new(ErrorKind::Other, "Schema setup failed"));
    }
    info!("Database schema ready");

    // Initialize components
    let repository = Arc::new(PgRepository::new(pool));
    let users: Arc<dyn UserRepository> = repository.clone();
    let analyses: Arc<dyn AnalysisRepository> = repository;
    let scorer = Arc::new(RiskScorer::new());
    let issuer = Arc::new(TokenIssuer::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl_hours,
    ));
    let model_client = Arc::new(
        ModelServiceClient::new(
            config.model_service.url.clone(),
            config.model_service.timeout_seconds,
        )
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?,
    );

    let registry = Registry::new();
    metrics::register_metrics(&registry)
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;

    info!("Model service proxy targets {}", model_client.url());

    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    let allowed_origins = server_config.allowed_origins.clone();
    let max_body_bytes = server_config.max_body_bytes;

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let issuer = issuer.clone();

        App::new()
            .app_data(
                web::JsonConfig::default()
                    .limit(max_body_bytes)
                    .error_handler(validation::json_error_handler),
            )
            .app_data(web::Data::new(users.clone()))
            .app_data(web::Data::new(analyses.clone()))
            .app_data(web::Data::new(scorer.clone()))
            .app_data(web::Data::new(threshold))
            .app_data(web::Data::new(issuer.clone()))
            .app_data(web::Data::new(model_client.clone()))
            .app_data(web::Data::new(registry.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(|cfg| handlers::configure_routes(cfg, issuer))
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await
}
