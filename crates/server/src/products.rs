//! Product REST routes.
//!
//! - `GET    /products`                    list every product
//! - `POST   /products`                    create, returns the whole collection
//! - `GET    /products/latest`             most recently created product
//! - `GET    /products/revision={value}`   first product with that revision
//! - `GET    /products/id={value}`         first product with that id
//! - `DELETE /products/revision={value}`   remove first product with that revision
//! - `DELETE /products/id={value}`         remove first product with that id
//! - `PUT    /products/{revision}`         replace first product with that revision

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use prodrev_core::domain::product::{Product, ProductId, ProductLookup};
use prodrev_db::ProductRepository;
use tracing::info;

use crate::error::ApiError;

#[derive(Clone)]
pub struct ProductState {
    repository: Arc<dyn ProductRepository>,
}

impl ProductState {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }
}

pub fn router(repository: Arc<dyn ProductRepository>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{selector}",
            get(get_product).delete(delete_product).put(update_product),
        )
        .with_state(ProductState::new(repository))
}

/// The single path segment after `/products/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductSelector {
    Latest,
    Lookup(ProductLookup),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorError {
    Unknown(String),
    InvalidId(String),
}

impl FromStr for ProductSelector {
    type Err = SelectorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "latest" {
            return Ok(Self::Latest);
        }
        if let Some(revision) = raw.strip_prefix("revision=") {
            return Ok(Self::Lookup(ProductLookup::Revision(revision.to_string())));
        }
        if let Some(id) = raw.strip_prefix("id=") {
            return id
                .trim()
                .parse::<i64>()
                .map(|id| Self::Lookup(ProductLookup::Id(ProductId(id))))
                .map_err(|_| SelectorError::InvalidId(id.to_string()));
        }
        Err(SelectorError::Unknown(raw.to_string()))
    }
}

impl From<SelectorError> for ApiError {
    fn from(value: SelectorError) -> Self {
        match value {
            SelectorError::Unknown(raw) => {
                ApiError::not_found(format!("No product route matches `{raw}`."))
            }
            SelectorError::InvalidId(raw) => {
                ApiError::bad_request(format!("Product id must be an integer, got `{raw}`."))
            }
        }
    }
}

async fn list_products(
    State(state): State<ProductState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.repository.list().await?))
}

async fn create_product(
    State(state): State<ProductState>,
    payload: Result<Json<Product>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Product>>), ApiError> {
    let Json(product) = payload?;
    let products = state.repository.create(product).await?;

    if let Some(created) = products.last() {
        info!(
            event_name = "api.product.created",
            product_id = %created.id,
            revision = %created.revision,
            backend = state.repository.backend_name(),
            "product created"
        );
    }

    Ok((StatusCode::CREATED, Json(products)))
}

async fn get_product(
    State(state): State<ProductState>,
    Path(selector): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = match selector.parse::<ProductSelector>()? {
        ProductSelector::Latest => state.repository.latest().await?,
        ProductSelector::Lookup(lookup) => state.repository.find_by(&lookup).await?,
    };
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<ProductState>,
    Path(selector): Path<String>,
) -> Result<StatusCode, ApiError> {
    let lookup = match selector.parse::<ProductSelector>()? {
        ProductSelector::Lookup(lookup) => lookup,
        ProductSelector::Latest => {
            return Err(ApiError::not_found("Deleting the latest product is not supported."));
        }
    };

    state.repository.delete_by(&lookup).await?;
    info!(event_name = "api.product.deleted", lookup = %lookup, "product deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// The whole path segment is the revision; `revision=` is not stripped here.
async fn update_product(
    State(state): State<ProductState>,
    Path(revision): Path<String>,
    payload: Result<Json<Product>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(product) = payload?;
    let updated = state.repository.update_by_revision(&revision, product).await?;
    info!(
        event_name = "api.product.updated",
        revision = %revision,
        product_id = %updated.id,
        "product replaced"
    );
    Ok(Json(updated))
}
