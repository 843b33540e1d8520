pub mod database;
pub mod lifecycle;
pub mod metrics;
pub mod seeder;
pub mod store;

pub use database::{MongoConnector, MongoDb};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use self::metrics::{get_metrics, init_metrics};
pub use seeder::{seed_database, seed_products, SeedOutcome};
pub use store::{MockConnector, MockProductStore, ProductStore, StoreConnector};
