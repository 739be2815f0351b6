use printstudio_api::{config::AppConfig, db::create_pool, services::auth_service};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());
    let admin_id = auth_service::upsert_admin(&pool, &email, &password).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}
