use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::{
    domain::product::{
        NewProduct as DomainNewProduct, Product as DomainProduct, ProductListQuery,
        UpdateProduct as DomainUpdateProduct,
    },
    models::product::{
        NewProduct as DbNewProduct, Product as DbProduct, UpdateProduct as DbUpdateProduct,
    },
    repository::{DieselRepository, ProductReader, ProductWriter, RepositoryError, RepositoryResult},
    schema::products,
};

/// Products matching the search filter of `query`, without ordering or paging.
fn filtered_products(query: &ProductListQuery) -> products::BoxedQuery<'static, Sqlite> {
    let mut items = products::table.into_boxed::<Sqlite>();

    if let Some(term) = query.search.as_deref() {
        let pattern = format!("%{}%", escape_like(term));
        items = items.filter(products::name.like(pattern).escape('\\'));
    }

    items
}

/// Escape `LIKE` wildcards so the term matches as a literal substring.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl ProductReader for DieselRepository {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<DomainProduct>> {
        let mut conn = self.conn()?;
        let product = products::table
            .filter(products::id.eq(id))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(DomainProduct::from))
    }

    fn product_name_exists(&self, name: &str, exclude_id: Option<i32>) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;

        let mut matches = products::table
            .filter(products::name.eq(name))
            .into_boxed::<Sqlite>();

        if let Some(id) = exclude_id {
            matches = matches.filter(products::id.ne(id));
        }

        let count = matches.count().get_result::<i64>(&mut conn)?;
        Ok(count > 0)
    }

    fn list_products(
        &self,
        query: ProductListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainProduct>)> {
        let mut conn = self.conn()?;

        let total = filtered_products(&query)
            .count()
            .get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered_products(&query)
            .order((products::created_at.desc(), products::id.desc()));

        if let Some(pagination) = &query.pagination {
            let (Ok(offset), Ok(limit)) = (
                i64::try_from(pagination.offset()),
                i64::try_from(pagination.per_page),
            ) else {
                // Nothing can live past the largest offset SQLite accepts.
                return Ok((total, Vec::new()));
            };
            items = items.offset(offset).limit(limit);
        }

        let db_products = items.load::<DbProduct>(&mut conn)?;
        let products = db_products.into_iter().map(DomainProduct::from).collect();

        Ok((total, products))
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(&self, new_product: &DomainNewProduct) -> RepositoryResult<DomainProduct> {
        let mut conn = self.conn()?;
        let db_new = DbNewProduct::from(new_product);

        let created = diesel::insert_into(products::table)
            .values(&db_new)
            .get_result::<DbProduct>(&mut conn)?;

        Ok(created.into())
    }

    fn update_product(
        &self,
        product_id: i32,
        updates: &DomainUpdateProduct,
    ) -> RepositoryResult<DomainProduct> {
        let mut conn = self.conn()?;
        let db_updates = DbUpdateProduct::from(updates);

        let target = products::table.filter(products::id.eq(product_id));

        let updated = diesel::update(target)
            .set(&db_updates)
            .get_result::<DbProduct>(&mut conn)?;

        Ok(updated.into())
    }

    fn delete_product(&self, product_id: i32) -> RepositoryResult<()> {
        let mut conn = self.conn()?;

        let target = products::table.filter(products::id.eq(product_id));

        let deleted = diesel::delete(target).execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
