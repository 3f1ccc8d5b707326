mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
use repos::Repos;
pub use repos::{IDeviceTokenRepo, IReminderRepo};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;

#[derive(Clone)]
pub struct EppetsContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub push: Arc<dyn IPushService>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl EppetsContext {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let config = Config::new();
        let push = Arc::new(FcmRestApi::new(&config));
        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            push,
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> EppetsContext {
    EppetsContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

/// Context wired against in process repositories and a recording push
/// service, to be used in tests
pub fn setup_context_inmemory() -> EppetsContext {
    EppetsContext {
        repos: Repos::create_inmemory(),
        config: Config::new(),
        sys: Arc::new(RealSys {}),
        push: Arc::new(InMemoryPushService::new()),
    }
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
