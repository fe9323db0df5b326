use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transita_api::{app, state::{AppState, AuthConfig}};
use transita_store::{CatalogRepository, DbClient, EventProducer, RedisClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transita_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = transita_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Transita API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");
    let db = Arc::new(db);

    // First boot gets the demo fleet so the seat map has something to serve
    if CatalogRepository::is_empty(&db.pool)
        .await
        .expect("Failed to inspect catalog")
    {
        let fleet = transita_catalog::seed::demo_fleet();
        CatalogRepository::seed(&db.pool, &fleet)
            .await
            .expect("Failed to seed catalog");
    }

    let redis = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis = Arc::new(redis);

    let kafka = EventProducer::new(&config.kafka.brokers)
        .expect("Failed to create Kafka producer");
    let kafka = Arc::new(kafka);

    let app_state = AppState {
        db: db.clone(),
        redis,
        events: kafka,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        business_rules: config.business_rules.clone(),
    };

    tokio::spawn(transita_api::worker::start_lock_sweeper(
        db.clone(),
        config.business_rules.lock_sweep_interval_seconds,
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
