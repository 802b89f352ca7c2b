use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use support_gateway::config::AppConfig;
use support_gateway::gateways::esewa::EsewaGateway;
use support_gateway::gateways::khalti::KhaltiGateway;
use support_gateway::ratelimit::MemoryRateLimitStore;
use support_gateway::repo::contributions_repo::ContributionsRepo;
use support_gateway::repo::verification_repo::VerificationRepo;
use support_gateway::service::payment_service::PaymentService;
use support_gateway::service::verification_runner::VerificationRunner;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.database_url)
        .await?;

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

    let service = PaymentService {
        pool,
        contributions_repo,
        verification_repo: verification_repo.clone(),
        esewa,
        khalti,
        // The worker never initiates, but the service wants a store.
        rate_limiter: Arc::new(MemoryRateLimitStore::new()),
        initiate_max_per_minute: 10,
    };

    let runner = VerificationRunner {
        service,
        verification_repo,
        poll_interval: std::time::Duration::from_secs(10),
        batch_size: 100,
        max_attempts: 6,
    };

    runner.run().await;
    Ok(())
}
