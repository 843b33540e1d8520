use crate::config::MongoConfig;
use crate::models::{NewProduct, Product};
use crate::services::store::{ProductStore, StoreConnector};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions, UpdateOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::sync::Arc;

pub const PRODUCTS_COLLECTION: &str = "products";
const FALLBACK_DATABASE: &str = "test";
const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    /// Builds the client and pings the server so a bad target fails here
    /// rather than on the first request.
    pub async fn connect(uri: &str, database: Option<&str>) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        options.app_name = Some("product-service".to_string());

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;

        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(FALLBACK_DATABASE)),
        };

        let mongo = Self { client, db };
        mongo.health_check().await?;

        tracing::info!(database = %mongo.db.name(), "Connected to MongoDB");
        Ok(mongo)
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    /// Unique index on `name` so concurrent seeders cannot both insert the
    /// same record. Only string names are indexed.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for product-service");

        let name_index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(
                IndexOptions::builder()
                    .name("seed_name_unique".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "name": { "$type": "string" } })
                    .build(),
            )
            .build();

        self.products()
            .create_index(name_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create name index on products collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on products.name");

        Ok(())
    }

    pub fn products(&self) -> Collection<Document> {
        self.db.collection(PRODUCTS_COLLECTION)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl ProductStore for MongoDb {
    async fn find_all(&self) -> Result<Option<Vec<Product>>, AppError> {
        let cursor = self.products().find(None, None).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        let products = documents
            .into_iter()
            .map(Product::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(products))
    }

    async fn is_empty(&self) -> Result<bool, AppError> {
        let count = self.products().count_documents(None, None).await?;
        Ok(count == 0)
    }

    async fn insert_missing(&self, records: &[NewProduct]) -> Result<u64, AppError> {
        let collection = self.products();
        let options = UpdateOptions::builder().upsert(true).build();

        let mut inserted = 0;
        for record in records {
            let mut fields = record.to_document();
            // `name` is supplied by the filter on insert.
            fields.remove("name");

            let filter = match &record.name {
                Some(name) => doc! { "name": name },
                None => doc! { "name": { "$exists": false } },
            };

            match collection
                .update_one(filter, doc! { "$setOnInsert": fields }, options.clone())
                .await
            {
                Ok(result) if result.upserted_id.is_some() => inserted += 1,
                Ok(_) => {}
                // Another writer inserted the same name between our filter
                // match and the upsert.
                Err(e) if is_duplicate_key(&e) => {
                    tracing::info!(name = ?record.name, "Seed record already inserted");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(inserted)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        MongoDb::health_check(self).await
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        *error.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref e)) if e.code == DUPLICATE_KEY
    )
}

/// Connects to the MongoDB deployment named by `MONGO_URI`.
pub struct MongoConnector {
    config: MongoConfig,
}

impl MongoConnector {
    pub fn new(config: MongoConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(&self) -> Result<Arc<dyn ProductStore>, AppError> {
        let uri = self.config.uri.as_ref().ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!("MONGO_URI is not set"))
        })?;

        let db = MongoDb::connect(uri.expose_secret(), self.config.database.as_deref()).await?;
        // Existing duplicate names prevent the index from building; the
        // collection is still served.
        if let Err(e) = db.initialize_indexes().await {
            tracing::warn!(error = %e, "Continuing without unique name index");
        }
        Ok(Arc::new(db))
    }
}
