use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use ledger_engine::{Metrics, PostingEngine};
use ledger_service::{config::Config, database, handlers, telemetry, PgLedgerStore};
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init(config.server.is_debug());

    info!(
        host = %config.server.host,
        port = config.server.port,
        mode = %config.server.mode,
        "Starting Ledger Service"
    );

    let pool = database::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;

    if config.database.run_migrations {
        database::run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    if config.database.seed_accounts {
        database::seed_chart_of_accounts(&pool)
            .await
            .context("Failed to seed chart of accounts")?;
    }

    let metrics = Arc::new(
        Metrics::new().map_err(|e| anyhow::anyhow!("Failed to create metrics: {}", e))?,
    );
    let engine = web::Data::new(
        PostingEngine::new(Arc::new(PgLedgerStore::new(pool)))
            .with_config(config.engine.clone())
            .with_metrics(metrics),
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .app_data(engine.clone())
            .configure(handlers::configure_routes::<PgLedgerStore>)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
