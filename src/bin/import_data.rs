//! Loads ingredient and tag fixtures into the database.
//!
//! Usage: `import-data --ingredients ingredients.json --tags tags.json`
//! Fixture files are JSON arrays; rows already present are skipped.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing_subscriber::EnvFilter;

use foodgram_sdk::actions;
use foodgram_sdk::{Config, TAG_SLUG_MAX_LENGTH};

#[derive(Deserialize)]
struct IngredientFixture {
    name: String,
    measurement_unit: String,
}

#[derive(Deserialize)]
struct TagFixture {
    name: String,
    color: Option<String>,
    slug: String,
}

fn read_fixture<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

async fn import_ingredients(
    path: &Path,
    pool: &Pool<Postgres>,
) -> Result<(), Box<dyn std::error::Error>> {
    let fixtures: Vec<IngredientFixture> = read_fixture(path)?;
    let total = fixtures.len();

    let mut inserted = 0;
    for fixture in fixtures {
        if actions::ingredients::create_ingredient(&fixture.name, &fixture.measurement_unit, pool)
            .await?
        {
            inserted += 1;
        }
    }

    tracing::info!(inserted, total, "imported ingredients");
    Ok(())
}

fn valid_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

async fn import_tags(path: &Path, pool: &Pool<Postgres>) -> Result<(), Box<dyn std::error::Error>> {
    let fixtures: Vec<TagFixture> = read_fixture(path)?;
    let total = fixtures.len();

    let mut inserted = 0;
    for fixture in fixtures {
        if fixture.slug.is_empty() || fixture.slug.len() > TAG_SLUG_MAX_LENGTH {
            return Err(format!("tag {}: invalid slug length", fixture.slug).into());
        }
        if let Some(color) = fixture.color.as_deref() {
            if !valid_hex_color(color) {
                return Err(format!("tag {}: color must be #rrggbb, got {color}", fixture.slug).into());
            }
        }
        if actions::tags::create_tag(&fixture.name, fixture.color.as_deref(), &fixture.slug, pool)
            .await?
        {
            inserted += 1;
        }
    }

    tracing::info!(inserted, total, "imported tags");
    Ok(())
}

struct Args {
    ingredients: Option<PathBuf>,
    tags: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        ingredients: None,
        tags: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("missing value for {flag}"))?;
        match flag.as_str() {
            "--ingredients" => args.ingredients = Some(value.into()),
            "--tags" => args.tags = Some(value.into()),
            other => return Err(format!("unknown argument {other}")),
        }
    }

    if args.ingredients.is_none() && args.tags.is_none() {
        return Err(String::from(
            "usage: import-data [--ingredients <file>] [--tags <file>]",
        ));
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = parse_args()?;
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    if let Some(path) = &args.ingredients {
        import_ingredients(path, &pool).await?;
    }
    if let Some(path) = &args.tags {
        import_tags(path, &pool).await?;
    }

    Ok(())
}
