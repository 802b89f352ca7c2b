use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use support_gateway::config::AppConfig;
use support_gateway::gateways::esewa::EsewaGateway;
use support_gateway::gateways::khalti::KhaltiGateway;
use support_gateway::http::middleware::rate_limit::RateLimitState;
use support_gateway::ratelimit::store_redis::RedisRateLimitStore;
use support_gateway::ratelimit::{MemoryRateLimitStore, RateLimitStore};
use support_gateway::repo::contributions_repo::ContributionsRepo;
use support_gateway::repo::verification_repo::VerificationRepo;
use support_gateway::service::payment_service::PaymentService;
use support_gateway::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let rate_limit_store: Arc<dyn RateLimitStore> = match &cfg.redis_url {
        Some(url) => Arc::new(RedisRateLimitStore::new(url)?),
        None => {
            let store = Arc::new(MemoryRateLimitStore::new());
            tokio::spawn(Arc::clone(&store).sweep_loop(std::time::Duration::from_secs(60)));
            store
        }
    };

    let contributions_repo = ContributionsRepo { pool: pool.clone() };
    let verification_repo = VerificationRepo { pool: pool.clone() };

    let callback_base = format!("{}/contributions/callback", cfg.public_base_url);
    let esewa = Arc::new(EsewaGateway {
        config: cfg.esewa.clone(),
        success_url: format!("{callback_base}/success"),
        failure_url: format!("{callback_base}/failure"),
        client: reqwest::Client::new(),
    });
    let khalti = Arc::new(KhaltiGateway {
        config: cfg.khalti.clone(),
        return_url: format!("{callback_base}/success"),
        website_url: cfg.public_base_url.clone(),
        client: reqwest::Client::new(),
    });

    let payment_service = PaymentService {
        pool: pool.clone(),
        contributions_repo: contributions_repo.clone(),
        verification_repo: verification_repo.clone(),
        esewa,
        khalti,
        rate_limiter: Arc::clone(&rate_limit_store),
        initiate_max_per_minute: 10,
    };

    let state = AppState {
        payment_service,
        contributions_repo,
        verification_repo,
    };

    let app = Router::new()
        .route("/health", get(support_gateway::http::handlers::contributions::health))
        .route(
            "/contributions",
            post(support_gateway::http::handlers::contributions::initiate),
        )
        .route(
            "/contributions/:contribution_id",
            get(support_gateway::http::handlers::contributions::get_contribution),
        )
        .route(
            "/contributions/callback/success/:contribution_id",
            get(support_gateway::http::handlers::contributions::callback_success),
        )
        .route(
            "/contributions/callback/failure/:contribution_id",
            get(support_gateway::http::handlers::contributions::callback_failure),
        )
        .route("/ops/readiness", get(support_gateway::http::handlers::ops::readiness))
        .route("/ops/liveness", get(support_gateway::http::handlers::ops::liveness))
        .layer(from_fn_with_state(
            RateLimitState {
                store: rate_limit_store,
                max_per_minute: cfg.rate_limit_per_minute,
            },
            support_gateway::http::middleware::rate_limit::enforce,
        ))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(environment = ?cfg.environment, "listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
