pub mod products;

pub use products::ProductResponse;
