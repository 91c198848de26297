use async_trait::async_trait;
use thiserror::Error;

use prodrev_core::domain::product::{Product, ProductLookup};
use prodrev_core::errors::{ApplicationError, ProductNotFound};

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    NotFound(#[from] ProductNotFound),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(not_found) => not_found.into(),
            RepositoryError::Database(error) => Self::Persistence(error.to_string()),
            RepositoryError::Decode(message) => Self::Persistence(message),
        }
    }
}

/// Storage seam for the product collection.
///
/// Every implementation keeps insertion order, resolves lookups to the first
/// match, and assigns ids in `1..100` to products submitted with id 0.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn latest(&self) -> Result<Product, RepositoryError>;

    async fn find_by(&self, lookup: &ProductLookup) -> Result<Product, RepositoryError>;

    async fn create(&self, product: Product) -> Result<Vec<Product>, RepositoryError>;

    async fn delete_by(&self, lookup: &ProductLookup) -> Result<(), RepositoryError>;

    async fn update_by_revision(
        &self,
        revision: &str,
        product: Product,
    ) -> Result<Product, RepositoryError>;

    async fn count(&self) -> Result<usize, RepositoryError>;

    fn backend_name(&self) -> &'static str;
}
