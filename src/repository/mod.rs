use crate::db::{DbConnection, DbPool};
use crate::domain::product::{NewProduct, Product, ProductListQuery, UpdateProduct};

pub mod errors;
pub mod product;

#[cfg(test)]
pub mod mock;

pub use errors::{RepositoryError, RepositoryResult};

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over product records.
pub trait ProductReader {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;
    /// Whether a product other than `exclude_id` already uses exactly `name`.
    fn product_name_exists(&self, name: &str, exclude_id: Option<i32>) -> RepositoryResult<bool>;
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
}

/// Write operations over product records.
pub trait ProductWriter {
    fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
    fn update_product(&self, product_id: i32, updates: &UpdateProduct) -> RepositoryResult<Product>;
    fn delete_product(&self, product_id: i32) -> RepositoryResult<()>;
}
