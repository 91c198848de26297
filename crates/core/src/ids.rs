use std::ops::Range;
use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;

use crate::domain::product::{Product, ProductId};

/// Ids handed out for products submitted without one.
///
/// Collisions with existing ids are not checked, so two stored products can
/// share an id. Lookups by id return the first one in insertion order.
pub const GENERATED_ID_RANGE: Range<i64> = 1..100;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> ProductId;

    /// Gives `product` a fresh id when it arrived with id 0; a caller-supplied id is kept.
    fn assign_if_unassigned(&self, product: &mut Product) {
        if product.id.is_unassigned() {
            product.id = self.next_id();
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> ProductId {
        ProductId(rand::thread_rng().gen_range(GENERATED_ID_RANGE))
    }
}

/// Deterministic generator for fixtures and tests. Wraps back to the start of
/// the range instead of leaving it.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicI64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: i64) -> Self {
        let first =
            if GENERATED_ID_RANGE.contains(&first) { first } else { GENERATED_ID_RANGE.start };
        Self { next: AtomicI64::new(first) }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::starting_at(GENERATED_ID_RANGE.start)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> ProductId {
        let span = GENERATED_ID_RANGE.end - GENERATED_ID_RANGE.start;
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        ProductId(GENERATED_ID_RANGE.start + (raw - GENERATED_ID_RANGE.start).rem_euclid(span))
    }
}
