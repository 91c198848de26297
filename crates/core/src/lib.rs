pub mod config;
pub mod domain;
pub mod errors;
pub mod ids;
pub mod store;

pub use domain::product::{LookupField, Product, ProductId, ProductLookup, DEFAULT_TRACK};
pub use errors::{ApplicationError, DomainError, InterfaceError, ProductNotFound};
pub use ids::{IdGenerator, RandomIdGenerator, SequentialIdGenerator, GENERATED_ID_RANGE};
pub use store::ProductStore;
