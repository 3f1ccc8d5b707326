mod telemetry;

use eppets_scheduler_api::Application;
use eppets_scheduler_infra::{run_migration, setup_context};
use telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    let subscriber = get_subscriber("eppets_scheduler".into(), "info".into());
    init_subscriber(subscriber);

    run_migration()
        .await
        .expect("Database migrations to succeed");

    let context = setup_context().await;

    let app = Application::new(context);
    app.start().await
}
