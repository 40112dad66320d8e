use std::sync::Arc;

use stride_planner::api::{create_routes, AppState};
use stride_planner::config::{run_migrations, AppConfig, DatabaseConfig, StoreBackend, TemplateSeeder};
use stride_planner::repository::{InMemoryStore, PgStore, PlanRepository, TemplateRepository};
use stride_planner::services::GenerationPolicy;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (plans, templates): (Arc<dyn PlanRepository>, Arc<dyn TemplateRepository>) = match config.store_backend {
        StoreBackend::Postgres => {
            let database = DatabaseConfig::from_env()?;
            info!("Connecting to {}", database.display_url());
            let pool = database.create_pool().await?;
            run_migrations(&pool).await?;
            let store = Arc::new(PgStore::new(pool));
            (store.clone(), store)
        }
        StoreBackend::Memory => {
            if config.is_production() {
                warn!("Using the in-memory store in production; plans are lost on restart");
            } else {
                info!("Using the in-memory store");
            }
            let store = Arc::new(InMemoryStore::new());
            (store.clone(), store)
        }
    };

    if config.seed_templates {
        let seeded = TemplateSeeder::new(templates.clone()).seed_if_empty().await?;
        if seeded {
            info!("Seeded template catalog");
        }
    }

    let policy = GenerationPolicy {
        backfill_past_as_completed: config.backfill_past_workouts,
    };
    info!("Backfill past workouts as completed: {}", policy.backfill_past_as_completed);
    let app = create_routes(AppState::new(plans, templates, policy));

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Stride planner ({}) listening on http://{}", config.environment, address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
