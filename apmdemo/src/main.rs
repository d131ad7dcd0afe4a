use apm_axum::start_server;
use apm_sqlite::Db;
use apmdemo::{
    AppConfig, Cli,
    impls::{DemoApp, PublicMedia},
};
use jwt_simple::prelude::HS256Key;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // By convention, we leverage `tracing` to instrument and log various
    // operations throughout this project.
    // Accordingly, we likely want to subscribe to these events so we can
    // write them to stdio and possibly some durable location.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI args and extract the JWT key
    let cli = Cli::import()?;
    let key = HS256Key::from_bytes(cli.secret.as_bytes());

    // Create config with proper layering of CLI args
    let AppConfig {
        server,
        database,
        media,
    } = AppConfig::load(&cli)?;

    // Open database with config
    let db = Db::open(&database).await?;
    let app = DemoApp {
        db,
        key,
        media: PublicMedia::new(media),
    };

    start_server(server, app).await?;

    Ok(())
}
