use std::sync::Arc;

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};

use prodrev_core::domain::product::{LookupField, Product, ProductId, ProductLookup};
use prodrev_core::errors::ProductNotFound;
use prodrev_core::ids::{IdGenerator, RandomIdGenerator};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const SELECT_PRODUCTS: &str =
    "SELECT id, number, name, description, revision, track FROM products ORDER BY seq";

/// Products stored in the `products` table. `seq` carries insertion order;
/// `id` is not a key and may repeat.
pub struct SqlProductRepository {
    pool: DbPool,
    ids: Arc<dyn IdGenerator>,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self::with_id_generator(pool, Arc::new(RandomIdGenerator))
    }

    pub fn with_id_generator(pool: DbPool, ids: Arc<dyn IdGenerator>) -> Self {
        Self { pool, ids }
    }
}

fn lookup_column(field: LookupField) -> &'static str {
    match field {
        LookupField::Id => "id",
        LookupField::Revision => "revision",
    }
}

fn bind_lookup<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    lookup: &'q ProductLookup,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match lookup {
        ProductLookup::Id(id) => query.bind(id.0),
        ProductLookup::Revision(revision) => query.bind(revision.as_str()),
    }
}

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let number: String =
        row.try_get("number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: Option<String> =
        row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: Option<String> =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let revision: String =
        row.try_get("revision").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let track: String =
        row.try_get("track").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Product { id: ProductId(id), number, name, description, revision, track })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(SELECT_PRODUCTS).fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Err(ProductNotFound::empty().into());
        }
        rows.iter().map(row_to_product).collect()
    }

    async fn latest(&self) -> Result<Product, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, number, name, description, revision, track
             FROM products
             ORDER BY seq DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_product(&row),
            None => Err(ProductNotFound::empty().into()),
        }
    }

    async fn find_by(&self, lookup: &ProductLookup) -> Result<Product, RepositoryError> {
        let sql = format!(
            "SELECT id, number, name, description, revision, track
             FROM products
             WHERE {} = ?
             ORDER BY seq
             LIMIT 1",
            lookup_column(lookup.field())
        );
        let row = bind_lookup(sqlx::query(&sql), lookup).fetch_optional(&self.pool).await?;

        match row {
            Some(row) => row_to_product(&row),
            None => Err(ProductNotFound::no_match(lookup.clone()).into()),
        }
    }

    async fn create(&self, mut product: Product) -> Result<Vec<Product>, RepositoryError> {
        self.ids.assign_if_unassigned(&mut product);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO products (id, number, name, description, revision, track)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id.0)
        .bind(&product.number)
        .bind(product.name.as_deref())
        .bind(product.description.as_deref())
        .bind(&product.revision)
        .bind(&product.track)
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query(SELECT_PRODUCTS).fetch_all(&mut *tx).await?;
        tx.commit().await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn delete_by(&self, lookup: &ProductLookup) -> Result<(), RepositoryError> {
        let sql = format!(
            "DELETE FROM products
             WHERE seq = (SELECT seq FROM products WHERE {} = ? ORDER BY seq LIMIT 1)",
            lookup_column(lookup.field())
        );
        let result = bind_lookup(sqlx::query(&sql), lookup).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(ProductNotFound::no_match(lookup.clone()).into());
        }
        Ok(())
    }

    async fn update_by_revision(
        &self,
        revision: &str,
        mut product: Product,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let seq: Option<i64> = sqlx::query_scalar(
            "SELECT seq FROM products WHERE revision = ? ORDER BY seq LIMIT 1",
        )
        .bind(revision)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(seq) = seq else {
            return Err(ProductNotFound::no_match(ProductLookup::Revision(revision.to_string()))
                .into());
        };

        self.ids.assign_if_unassigned(&mut product);
        sqlx::query(
            "UPDATE products
             SET id = ?, number = ?, name = ?, description = ?, revision = ?, track = ?
             WHERE seq = ?",
        )
        .bind(product.id.0)
        .bind(&product.number)
        .bind(product.name.as_deref())
        .bind(product.description.as_deref())
        .bind(&product.revision)
        .bind(&product.track)
        .bind(seq)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(product)
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?;
        usize::try_from(count).map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use prodrev_core::domain::product::{Product, ProductId};

    use crate::repositories::{ProductRepository, SqlProductRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn optional_fields_round_trip_as_null() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlProductRepository::new(pool.clone());

        let mut product = Product::new("N1", "R1");
        product.id = ProductId(12);
        product.description = Some("first cut".to_string());
        repo.create(product.clone()).await.expect("create");

        let row = sqlx::query("SELECT name, description, track FROM products WHERE id = 12")
            .fetch_one(&pool)
            .await
            .expect("fetch row");
        assert_eq!(row.get::<Option<String>, _>("name"), None);
        assert_eq!(row.get::<Option<String>, _>("description"), Some("first cut".to_string()));
        assert_eq!(row.get::<String, _>("track"), "main");

        let stored = repo.find_by(&prodrev_core::ProductLookup::Id(ProductId(12))).await;
        assert_eq!(stored.expect("find"), product);
        assert_eq!(repo.backend_name(), "sqlite");
    }
}
