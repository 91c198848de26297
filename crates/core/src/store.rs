//! In-memory product collection and its lookup/mutation rules.
//!
//! The collection is insertion ordered. Lookups scan from the front and the
//! first match wins; "latest" is whatever was appended last. Ids are not
//! unique (see [`crate::ids::GENERATED_ID_RANGE`]).

use std::sync::Arc;

use crate::domain::product::{Product, ProductLookup};
use crate::errors::ProductNotFound;
use crate::ids::{IdGenerator, RandomIdGenerator};

pub struct ProductStore {
    products: Vec<Product>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::with_id_generator(Arc::new(RandomIdGenerator))
    }
}

impl ProductStore {
    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self { products: Vec::new(), ids }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn list(&self) -> Result<&[Product], ProductNotFound> {
        if self.products.is_empty() {
            return Err(ProductNotFound::empty());
        }
        Ok(&self.products)
    }

    pub fn latest(&self) -> Result<&Product, ProductNotFound> {
        self.products.last().ok_or_else(ProductNotFound::empty)
    }

    pub fn find_by(&self, lookup: &ProductLookup) -> Result<&Product, ProductNotFound> {
        self.products
            .iter()
            .find(|product| product.matches(lookup))
            .ok_or_else(|| ProductNotFound::no_match(lookup.clone()))
    }

    /// Appends `product`, assigning an id when it has none, and returns the
    /// whole collection.
    pub fn create(&mut self, mut product: Product) -> &[Product] {
        self.ids.assign_if_unassigned(&mut product);
        self.products.push(product);
        &self.products
    }

    pub fn delete_by(&mut self, lookup: &ProductLookup) -> Result<(), ProductNotFound> {
        let position = self.position(lookup)?;
        self.products.remove(position);
        Ok(())
    }

    /// Replaces the first product carrying `revision` with `product` in place.
    ///
    /// Nothing from the old record survives: `product` is stored as given,
    /// except that a zero id is swapped for a freshly generated one.
    pub fn update_by_revision(
        &mut self,
        revision: &str,
        mut product: Product,
    ) -> Result<&Product, ProductNotFound> {
        let position = self.position(&ProductLookup::Revision(revision.to_string()))?;
        self.ids.assign_if_unassigned(&mut product);
        self.products[position] = product;
        Ok(&self.products[position])
    }

    fn position(&self, lookup: &ProductLookup) -> Result<usize, ProductNotFound> {
        self.products
            .iter()
            .position(|product| product.matches(lookup))
            .ok_or_else(|| ProductNotFound::no_match(lookup.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::domain::product::{Product, ProductId, ProductLookup, DEFAULT_TRACK};
    use crate::errors::ProductNotFound;
    use crate::ids::{SequentialIdGenerator, GENERATED_ID_RANGE};

    use super::ProductStore;

    fn sequential_store(first_id: i64) -> ProductStore {
        ProductStore::with_id_generator(Arc::new(SequentialIdGenerator::starting_at(first_id)))
    }

    fn revision(value: &str) -> ProductLookup {
        ProductLookup::Revision(value.to_string())
    }

    #[test]
    fn empty_store_reports_not_found_for_list_and_latest() {
        let store = ProductStore::default();

        assert_eq!(store.list(), Err(ProductNotFound::empty()));
        assert_eq!(store.latest(), Err(ProductNotFound::empty()));
    }

    #[test]
    fn create_assigns_id_in_range_and_returns_full_collection() {
        let mut store = ProductStore::default();

        let products = store.create(Product::new("N1", "R1"));

        assert_eq!(products.len(), 1);
        assert!(GENERATED_ID_RANGE.contains(&products[0].id.0));
    }

    #[test]
    fn create_keeps_caller_supplied_id_and_allows_duplicates() {
        let mut store = sequential_store(10);
        let mut first = Product::new("N1", "R1");
        first.id = ProductId(10);

        store.create(first);
        let products = store.create(Product::new("N2", "R2"));

        assert_eq!(products[0].id, ProductId(10));
        assert_eq!(products[1].id, ProductId(10), "generated id may repeat an existing one");
        assert_eq!(
            store.find_by(&ProductLookup::Id(ProductId(10))).map(|p| p.number.as_str()),
            Ok("N1"),
            "first match wins on duplicate ids"
        );
    }

    #[test]
    fn latest_is_last_appended_not_highest_id() {
        let mut store = sequential_store(50);
        let mut high = Product::new("N1", "R9");
        high.id = ProductId(99);
        store.create(high);
        let created = store.create(Product::new("N2", "R1")).last().cloned().expect("created");

        assert_eq!(store.latest(), Ok(&created));
        assert_eq!(created.id, ProductId(50));
    }

    #[test]
    fn find_by_revision_returns_first_match() {
        let mut store = sequential_store(1);
        store.create(Product::new("first", "R1"));
        store.create(Product::new("second", "R1"));

        let found = store.find_by(&revision("R1")).expect("find by revision");

        assert_eq!(found.number, "first");
        assert_eq!(
            store.find_by(&revision("R2")),
            Err(ProductNotFound::no_match(revision("R2")))
        );
    }

    #[test]
    fn delete_then_lookup_yields_not_found() {
        let mut store = sequential_store(7);
        store.create(Product::new("N1", "R1"));
        store.create(Product::new("N2", "R2"));

        store.delete_by(&ProductLookup::Id(ProductId(7))).expect("delete by id");
        store.delete_by(&revision("R2")).expect("delete by revision");

        assert!(store.find_by(&ProductLookup::Id(ProductId(7))).is_err());
        assert!(store.find_by(&revision("R2")).is_err());
        assert_eq!(
            store.delete_by(&revision("R2")),
            Err(ProductNotFound::no_match(revision("R2")))
        );
    }

    #[test]
    fn delete_removes_only_first_match() {
        let mut store = sequential_store(1);
        store.create(Product::new("first", "R1"));
        store.create(Product::new("second", "R1"));

        store.delete_by(&revision("R1")).expect("delete");

        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by(&revision("R1")).map(|p| p.number.as_str()), Ok("second"));
    }

    #[test]
    fn create_then_delete_by_revision_empties_list() {
        let mut store = ProductStore::default();
        let products = store.create(Product::new("N1", "R1"));
        assert_eq!(products.len(), 1);
        assert!(!products[0].id.is_unassigned());

        store.delete_by(&revision("R1")).expect("delete");

        assert_eq!(store.list(), Err(ProductNotFound::empty()));
        assert_eq!(store.latest(), Err(ProductNotFound::empty()));
    }

    #[test]
    fn latest_after_single_create_is_that_product() {
        let mut store = sequential_store(3);
        store.create(Product::new("N1", "R1"));
        store.delete_by(&revision("R1")).expect("delete");
        assert!(store.latest().is_err());

        store.create(Product::new("N2", "R2"));

        let latest = store.latest().expect("latest");
        assert_eq!(latest.number, "N2");
        assert_eq!(latest.id, ProductId(4));
    }

    #[test]
    fn update_replaces_whole_record_and_defaults_missing_fields() {
        let mut store = sequential_store(20);
        let mut original = Product::new("N1", "A");
        original.name = Some("widget".to_string());
        original.description = Some("blue".to_string());
        original.track = "beta".to_string();
        store.create(original);
        store.create(Product::new("N3", "B"));

        let updated =
            store.update_by_revision("A", Product::new("N2", "A")).expect("update").clone();

        assert_eq!(updated.id, ProductId(22));
        assert_eq!(updated.number, "N2");
        assert_eq!(updated.name, None);
        assert_eq!(updated.description, None);
        assert_eq!(updated.track, DEFAULT_TRACK);
        assert_eq!(store.list().map(|products| products[0].clone()), Ok(updated));
    }

    #[test]
    fn update_keeps_supplied_id_and_may_change_revision() {
        let mut store = sequential_store(1);
        store.create(Product::new("N1", "A"));
        let mut change = Product::new("N1", "A2");
        change.id = ProductId(77);

        let updated = store.update_by_revision("A", change).expect("update").clone();

        assert_eq!(updated.id, ProductId(77));
        assert!(store.find_by(&revision("A")).is_err());
        assert_eq!(store.find_by(&revision("A2")), Ok(&updated));
    }

    #[test]
    fn update_of_unknown_revision_is_not_found() {
        let mut store = sequential_store(1);
        store.create(Product::new("N1", "A"));

        let result = store.update_by_revision("Z", Product::new("N2", "Z"));

        assert_eq!(result, Err(ProductNotFound::no_match(revision("Z"))));
        assert_eq!(store.len(), 1);
    }
}
