#![deny(warnings)]

use persistence::{
    default_sqlite_url, keys, CategoryRepository, PriceHistoryRepository, SqliteStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| default_sqlite_url().to_string());
    let store = SqliteStore::connect(&url).await?;
    // Materialize the sample reference data so later edits start from it
    let categories = CategoryRepository::new(store.clone());
    let prices = PriceHistoryRepository::new(store);
    categories.save_all(&categories.load().await?).await?;
    prices.save_all(&prices.load().await?).await?;
    println!(
        "DB migrated at {} ({} and {} initialized)",
        url,
        keys::EQUIPMENT_CATEGORIES,
        keys::PRICE_HISTORY
    );
    Ok(())
}
