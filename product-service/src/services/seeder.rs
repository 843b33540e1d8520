use crate::models::NewProduct;
use crate::services::store::ProductStore;
use metrics::counter;
use service_core::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The collection was empty; this many records were created.
    Seeded(u64),
    AlreadyPopulated,
    Disabled,
    /// The store failed; the error has been logged.
    Failed,
}

/// The fixed records written into an empty catalogue.
pub fn seed_products() -> Vec<NewProduct> {
    vec![
        NewProduct::new("Product 1", 10.0).with_image_url("images/product1.jpg"),
        NewProduct::new("Product 2", 20.0).with_image_url("images/product2.jpg"),
        NewProduct::new("Product 3", 30.0).with_image_url("images/product3.jpg"),
    ]
}

/// Populate an empty product collection. Never returns an error: store
/// failures are logged and reported as [`SeedOutcome::Failed`].
pub async fn seed_database(store: &dyn ProductStore) -> SeedOutcome {
    match try_seed(store).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Error seeding database");
            SeedOutcome::Failed
        }
    }
}

async fn try_seed(store: &dyn ProductStore) -> Result<SeedOutcome, AppError> {
    if !store.is_empty().await? {
        tracing::info!("Database already contains products");
        return Ok(SeedOutcome::AlreadyPopulated);
    }

    let inserted = store.insert_missing(&seed_products()).await?;
    counter!("products_seeded_total").increment(inserted);
    tracing::info!(inserted, "Database seeded");

    Ok(SeedOutcome::Seeded(inserted))
}
