use tokio::sync::Mutex;

use prodrev_core::domain::product::{Product, ProductLookup};
use prodrev_core::store::ProductStore;

use super::{ProductRepository, RepositoryError};

/// `ProductStore` shared between request handlers. One lock guards the whole
/// collection, so at most one operation touches it at a time.
#[derive(Default)]
pub struct InMemoryProductRepository {
    store: Mutex<ProductStore>,
}

impl InMemoryProductRepository {
    pub fn new(store: ProductStore) -> Self {
        Self { store: Mutex::new(store) }
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.list()?.to_vec())
    }

    async fn latest(&self) -> Result<Product, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.latest()?.clone())
    }

    async fn find_by(&self, lookup: &ProductLookup) -> Result<Product, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.find_by(lookup)?.clone())
    }

    async fn create(&self, product: Product) -> Result<Vec<Product>, RepositoryError> {
        let mut store = self.store.lock().await;
        Ok(store.create(product).to_vec())
    }

    async fn delete_by(&self, lookup: &ProductLookup) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        store.delete_by(lookup)?;
        Ok(())
    }

    async fn update_by_revision(
        &self,
        revision: &str,
        product: Product,
    ) -> Result<Product, RepositoryError> {
        let mut store = self.store.lock().await;
        Ok(store.update_by_revision(revision, product)?.clone())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.store.lock().await.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use prodrev_core::domain::product::Product;

    use crate::repositories::{InMemoryProductRepository, ProductRepository};

    #[tokio::test]
    async fn concurrent_creates_are_all_kept() {
        let repo = Arc::new(InMemoryProductRepository::default());

        let handles: Vec<_> = (0..16)
            .map(|index| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.create(Product::new(format!("N{index}"), format!("R{index}"))).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join").expect("create");
        }

        let products = repo.list().await.expect("list");
        assert_eq!(products.len(), 16);
        assert!(products.iter().all(|product| !product.id.is_unassigned()));
    }
}
