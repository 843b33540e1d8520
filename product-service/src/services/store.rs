use crate::models::{NewProduct, Product};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Read/seed access to the product collection.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Every product in the collection. `None` means the store produced no
    /// result at all, which is distinct from an empty collection.
    async fn find_all(&self) -> Result<Option<Vec<Product>>, AppError>;

    async fn is_empty(&self) -> Result<bool, AppError>;

    /// Insert each record unless one with the same `name` already exists.
    /// Returns how many records were actually created.
    async fn insert_missing(&self, records: &[NewProduct]) -> Result<u64, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Opens the long-lived store handle at startup.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ProductStore>, AppError>;
}

/// In-memory store for tests and local experiments.
pub struct MockProductStore {
    pub products: Mutex<Vec<Product>>,
    /// Make queries and inserts fail with a database error.
    pub fail_queries: AtomicBool,
    /// Make `find_all` return `None`.
    pub return_none: AtomicBool,
}

impl Default for MockProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProductStore {
    pub fn new() -> Self {
        Self {
            products: Mutex::new(Vec::new()),
            fail_queries: AtomicBool::new(false),
            return_none: AtomicBool::new(false),
        }
    }

    pub fn with_products(records: Vec<NewProduct>) -> Self {
        let store = Self::new();
        if let Ok(mut products) = store.products.lock() {
            products.extend(records.into_iter().map(|r| r.into_product(ObjectId::new())));
        }
        store
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn set_return_none(&self, none: bool) {
        self.return_none.store(none, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.products.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "simulated store failure"
            )));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Product>>, AppError> {
        self.products.lock().map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Mock store mutex poisoned: {}", e))
        })
    }
}

#[async_trait]
impl ProductStore for MockProductStore {
    async fn find_all(&self) -> Result<Option<Vec<Product>>, AppError> {
        self.check_available()?;
        if self.return_none.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(self.lock()?.clone()))
    }

    async fn is_empty(&self) -> Result<bool, AppError> {
        self.check_available()?;
        let empty = self.lock()?.is_empty();
        // Let other tasks run between the check and the caller's insert, as
        // a round trip to a real store would.
        tokio::task::yield_now().await;
        Ok(empty)
    }

    async fn insert_missing(&self, records: &[NewProduct]) -> Result<u64, AppError> {
        self.check_available()?;
        let mut products = self.lock()?;
        let mut inserted = 0;
        for record in records {
            if products.iter().any(|p| p.name() == record.name.as_deref()) {
                continue;
            }
            products.push(record.clone().into_product(ObjectId::new()));
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check_available()
    }
}

/// Connector that hands out a prepared store, or fails when none is set.
#[derive(Clone, Default)]
pub struct MockConnector {
    store: Option<Arc<MockProductStore>>,
}

impl MockConnector {
    pub fn new(store: Arc<MockProductStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn unreachable() -> Self {
        Self { store: None }
    }
}

#[async_trait]
impl StoreConnector for MockConnector {
    async fn connect(&self) -> Result<Arc<dyn ProductStore>, AppError> {
        match &self.store {
            Some(store) => Ok(store.clone() as Arc<dyn ProductStore>),
            None => Err(AppError::DatabaseError(anyhow::anyhow!(
                "simulated connection failure"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_missing_skips_existing_names() {
        let store = MockProductStore::with_products(vec![NewProduct::new("Product 1", 10.0)]);

        let inserted = store
            .insert_missing(&[
                NewProduct::new("Product 1", 10.0),
                NewProduct::new("Product 2", 20.0),
            ])
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn failure_flag_affects_every_operation() {
        let store = MockProductStore::new();
        store.set_fail_queries(true);

        assert!(store.find_all().await.is_err());
        assert!(store.is_empty().await.is_err());
        assert!(store.insert_missing(&[]).await.is_err());
        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn unreachable_connector_fails() {
        assert!(MockConnector::unreachable().connect().await.is_err());
    }
}
