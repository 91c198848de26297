pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_retry, connect_with_settings, DbPool, RetryPolicy};
pub use repositories::{
    InMemoryProductRepository, ProductRepository, RepositoryError, SqlProductRepository,
};
