use dotenvy::dotenv;
use tax_buddy::{
    config::{database, taxes},
    core::tax,
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed default tax rules
    let seed = taxes::load_default_config()
        .inspect_err(|e| error!("Failed to load tax configuration: {}", e))?;
    taxes::seed_taxes(&db, &seed)
        .await
        .inspect_err(|e| error!("Failed to seed tax rules: {}", e))?;

    // 5. Report what will be charged
    for rule in tax::list_active_taxes(&db).await? {
        info!(
            tax_type = %rule.tax_type,
            rate_type = ?rule.rate_type,
            rate = rule.charge_rate,
            after_vat = rule.apply_after_vat,
            included = rule.is_included,
            "Active tax rule {}",
            rule.display_name
        );
    }

    Ok(())
}
