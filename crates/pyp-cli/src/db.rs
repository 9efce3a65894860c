//! Database maintenance commands. These talk to Postgres directly and need
//! the server configuration (`DATABASE_URL`).

use std::time::Duration;

use clap::Subcommand;

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check that the database answers
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Load the catalog seed into empty collections
    Seed,
    /// Delete expired OTP codes
    PurgeOtps,
}

pub(crate) async fn run(command: DbCommands) -> anyhow::Result<()> {
    let config = pyp_core::load_app_config()?;
    let pool = pyp_db::connect_pool(
        &config.database_url,
        pyp_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match command {
        DbCommands::Ping => run_ping(&pool).await,
        DbCommands::Migrate => {
            let applied = pyp_db::run_migrations(&pool).await?;
            println!("migrations up to date ({applied} applied)");
            Ok(())
        }
        DbCommands::Seed => run_seed(&pool, &config.catalog_path).await,
        DbCommands::PurgeOtps => {
            let purged = pyp_db::purge_expired_otps(&pool).await?;
            println!("purged {purged} expired OTP code(s)");
            Ok(())
        }
    }
}

async fn run_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    tokio::time::timeout(Duration::from_secs(5), pyp_db::health_check(pool))
        .await
        .map_err(|_| anyhow::anyhow!("database did not answer within 5s"))??;
    println!("database ok");
    Ok(())
}

/// Seed empty collections from the catalog file.
///
/// Collections that already hold documents are left alone, so running this
/// twice is harmless.
async fn run_seed(pool: &sqlx::PgPool, catalog_path: &std::path::Path) -> anyhow::Result<()> {
    let seed = pyp_core::load_catalog(catalog_path)?;
    let report = pyp_db::seed_catalog(pool, &seed).await?;

    if report.total() == 0 && !report.config {
        println!("nothing to seed; every collection already has data");
        return Ok(());
    }

    println!(
        "seeded {} products, {} categories, {} coupons, {} reviews, {} banners{}",
        report.products,
        report.categories,
        report.coupons,
        report.reviews,
        report.banners,
        if report.config { " and site settings" } else { "" }
    );
    Ok(())
}
