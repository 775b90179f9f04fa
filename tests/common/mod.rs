//! Helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use product_inventory::db::{DbPool, establish_connection_pool, run_migrations};
use product_inventory::domain::product::NewProduct;
use product_inventory::repository::{DieselRepository, ProductWriter};

/// Temporary, fully migrated database used in integration tests.
pub struct TestDb {
    // Keeps the directory alive; dropping it removes the database files.
    dir: TempDir,
    path: PathBuf,
    pool: DbPool,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
        let path = dir.path().join(filename);
        let url = path.to_str().expect("Temporary path is not valid UTF-8.");

        let pool = establish_connection_pool(url).expect("Failed to establish SQLite connection.");
        run_migrations(&pool).expect("Migrations failed");

        TestDb { dir, path, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Insert `count` products named `Product 01`, `Product 02`, ... in creation order.
pub fn seed_products(repo: &DieselRepository, count: usize) {
    for index in 1..=count {
        repo.create_product(&NewProduct::new(format!("Product {index:02}"), 1000, 1))
            .expect("seed product");
    }
}
