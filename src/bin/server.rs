use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use warp::Filter;

use foodgram_sdk::rejection::handle_rejection;
use foodgram_sdk::routes::routes;
use foodgram_sdk::{Config, Context};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "starting up");

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let bind_addr = config.bind_addr;
    let ctx = Context::new(pool, config);

    tracing::info!(%bind_addr, "listening");
    warp::serve(routes(ctx).recover(handle_rejection))
        .run(bind_addr)
        .await;

    Ok(())
}
