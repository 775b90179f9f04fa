use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductListQuery, format_amount_grouped};
use crate::forms::products::{ProductForm, ProductPayload};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated, Pagination};
use crate::repository::{ProductReader, ProductWriter};
use crate::services::{ServiceError, ServiceResult};

/// Query parameters accepted by the products index page.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    /// Optional search string entered by the user.
    pub search: Option<String>,
    /// Page requested by the UI (1-based).
    pub page: Option<usize>,
}

/// Data required to render the products index template.
pub struct ProductsPageData {
    /// Paginated list of products displayed in the table.
    pub products: Paginated<ProductView>,
    /// Search query echoed back to the view when present.
    pub search: Option<String>,
}

/// Lists products whose name contains `search`, newest first, 10 per page.
/// An empty `search` lists everything; a page past the end is empty.
pub fn list_products<R>(repo: &R, search: &str, page: usize) -> ServiceResult<Paginated<Product>>
where
    R: ProductReader + ?Sized,
{
    let pagination = Pagination {
        page,
        per_page: DEFAULT_ITEMS_PER_PAGE,
    };
    let query = ProductListQuery::new()
        .search(search)
        .paginate(pagination.page, pagination.per_page);

    let (total, items) = repo.list_products(query)?;
    Ok(Paginated::new(items, pagination, total))
}

/// Loads the products overview page.
pub fn load_products_page<R>(repo: &R, query: ProductsQuery) -> ServiceResult<ProductsPageData>
where
    R: ProductReader + ?Sized,
{
    let ProductsQuery { search, page } = query;
    let search = search.filter(|term| !term.is_empty());

    let products = list_products(repo, search.as_deref().unwrap_or(""), page.unwrap_or(1))?
        .map(ProductView::from);

    Ok(ProductsPageData { products, search })
}

/// Fetches a single product, failing with [`ServiceError::NotFound`] when absent.
pub fn find_product<R>(repo: &R, product_id: i32) -> ServiceResult<Product>
where
    R: ProductReader + ?Sized,
{
    repo.get_product_by_id(product_id)?
        .ok_or(ServiceError::NotFound)
}

/// Runs the field rules plus the name uniqueness probe against the store.
/// `exclude_id` lets a product keep its own name on update.
pub fn validate_product<R>(
    repo: &R,
    form: ProductForm,
    exclude_id: Option<i32>,
) -> ServiceResult<ProductPayload>
where
    R: ProductReader + ?Sized,
{
    let name_taken = match form.name_value() {
        Some(name) => repo.product_name_exists(name, exclude_id)?,
        None => false,
    };

    form.into_payload(name_taken)
        .map_err(ServiceError::Validation)
}

/// Validates `form` and stores it as a new product.
pub fn create_product<R>(repo: &R, form: ProductForm) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    let payload = validate_product(repo, form, None)?;

    repo.create_product(&payload.into_new_product())
        .map_err(ServiceError::from)
}

/// Validates `form` and replaces the name, amount and quantity of `product_id`.
pub fn update_product<R>(repo: &R, product_id: i32, form: ProductForm) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    let payload = validate_product(repo, form, Some(product_id))?;

    repo.update_product(product_id, &payload.into_update_product())
        .map_err(ServiceError::from)
}

/// Permanently removes a product. Deleting an absent id fails with `NotFound`.
pub fn delete_product<R>(repo: &R, product_id: i32) -> ServiceResult<()>
where
    R: ProductWriter + ?Sized,
{
    repo.delete_product(product_id)
        .map_err(ServiceError::from)
}

/// View model exposed to the products index template.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    /// Two-digit decimal, e.g. `150000.00`.
    pub amount: String,
    /// Whole units with thousands separators, e.g. `150.000`.
    pub amount_display: String,
    pub qty: i32,
    /// Creation date formatted as `dd Mon YYYY`.
    pub created_on: String,
    pub updated_at: NaiveDateTime,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let amount = product.amount();
        let Product {
            id,
            name,
            amount_cents,
            qty,
            created_at,
            updated_at,
        } = product;

        Self {
            id,
            name,
            amount,
            amount_display: format_amount_grouped(amount_cents),
            qty,
            created_on: created_at.format("%d %b %Y").to_string(),
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::Value;

    use crate::domain::product::{NewProduct, UpdateProduct};
    use crate::forms::products::{
        AMOUNT_NEGATIVE, FIELD_AMOUNT, FIELD_NAME, FIELD_QTY, NAME_TAKEN, QTY_REQUIRED,
    };
    use crate::repository::mock::{MockProductReader, MockProductWriter};
    use crate::repository::{RepositoryError, RepositoryResult};

    fn datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    fn sample_product(id: i32, name: &str, amount_cents: i64, qty: i32) -> Product {
        Product {
            id,
            name: name.to_string(),
            amount_cents,
            qty,
            created_at: datetime(),
            updated_at: datetime(),
        }
    }

    struct FakeRepo {
        product_reader: MockProductReader,
        product_writer: MockProductWriter,
    }

    impl FakeRepo {
        fn new() -> Self {
            Self {
                product_reader: MockProductReader::new(),
                product_writer: MockProductWriter::new(),
            }
        }
    }

    impl ProductReader for FakeRepo {
        fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>> {
            self.product_reader.get_product_by_id(id)
        }

        fn product_name_exists(
            &self,
            name: &str,
            exclude_id: Option<i32>,
        ) -> RepositoryResult<bool> {
            self.product_reader.product_name_exists(name, exclude_id)
        }

        fn list_products(
            &self,
            query: ProductListQuery,
        ) -> RepositoryResult<(usize, Vec<Product>)> {
            self.product_reader.list_products(query)
        }
    }

    impl ProductWriter for FakeRepo {
        fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product> {
            self.product_writer.create_product(new_product)
        }

        fn update_product(
            &self,
            product_id: i32,
            updates: &UpdateProduct,
        ) -> RepositoryResult<Product> {
            self.product_writer.update_product(product_id, updates)
        }

        fn delete_product(&self, product_id: i32) -> RepositoryResult<()> {
            self.product_writer.delete_product(product_id)
        }
    }

    #[test]
    fn load_products_page_returns_views() {
        let mut repo = MockProductReader::new();

        repo.expect_list_products()
            .times(1)
            .withf(|query| {
                assert_eq!(query.search.as_deref(), Some("Laptop"));
                match &query.pagination {
                    Some(pagination) => {
                        assert_eq!(pagination.page, 2);
                        assert_eq!(pagination.per_page, DEFAULT_ITEMS_PER_PAGE);
                    }
                    None => panic!("expected pagination to be set"),
                }
                true
            })
            .returning(|_| {
                Ok((
                    12,
                    vec![
                        sample_product(12, "Laptop Pro", 2_500_000_00, 2),
                        sample_product(11, "Laptop", 1_500_000_00, 4),
                    ],
                ))
            });

        let query = ProductsQuery {
            search: Some("Laptop".to_string()),
            page: Some(2),
        };
        let data = load_products_page(&repo, query).expect("expected success");

        assert_eq!(data.search.as_deref(), Some("Laptop"));

        let serialized = serde_json::to_value(&data.products).expect("serialization");
        assert_eq!(serialized.get("page").and_then(Value::as_u64), Some(2));
        assert_eq!(serialized.get("total").and_then(Value::as_u64), Some(12));
        assert_eq!(serialized.get("total_pages").and_then(Value::as_u64), Some(2));

        let items = serialized
            .get("items")
            .and_then(Value::as_array)
            .expect("items array");
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0].get("amount").and_then(Value::as_str),
            Some("2500000.00")
        );
        assert_eq!(
            items[0].get("amount_display").and_then(Value::as_str),
            Some("2.500.000")
        );
        assert_eq!(
            items[0].get("created_on").and_then(Value::as_str),
            Some("01 Jan 2024")
        );
    }

    #[test]
    fn load_products_page_defaults_to_first_page_without_search() {
        let mut repo = MockProductReader::new();

        repo.expect_list_products()
            .times(1)
            .withf(|query| {
                assert_eq!(query.search, None);
                assert_eq!(query.pagination.map(|p| p.page), Some(1));
                true
            })
            .returning(|_| Ok((0, Vec::new())));

        let query = ProductsQuery {
            search: Some(String::new()),
            page: None,
        };
        let data = load_products_page(&repo, query).expect("expected success");

        assert_eq!(data.search, None);
        assert!(data.products.items.is_empty());
        assert_eq!(data.products.total_pages, 0);
    }

    #[test]
    fn find_product_maps_missing_to_not_found() {
        let mut repo = MockProductReader::new();
        repo.expect_get_product_by_id()
            .withf(|id| *id == 9)
            .returning(|_| Ok(None));

        let result = find_product(&repo, 9);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn create_product_persists_valid_form() {
        let mut repo = FakeRepo::new();

        repo.product_reader
            .expect_product_name_exists()
            .times(1)
            .withf(|name, exclude_id| name == "Monitor" && exclude_id.is_none())
            .returning(|_, _| Ok(false));

        repo.product_writer
            .expect_create_product()
            .times(1)
            .withf(|new_product| {
                assert_eq!(new_product.name, "Monitor");
                assert_eq!(new_product.amount_cents, 15_000_000);
                assert_eq!(new_product.qty, 5);
                true
            })
            .returning(|new_product| {
                Ok(sample_product(
                    1,
                    &new_product.name,
                    new_product.amount_cents,
                    new_product.qty,
                ))
            });

        let form = ProductForm::new("Monitor", "150000.00", "5");
        let product = create_product(&repo, form).expect("expected success");

        assert_eq!(product.id, 1);
        assert_eq!(product.amount(), "150000.00");
        assert_eq!(product.qty, 5);
    }

    #[test]
    fn create_product_rejects_taken_name_without_writing() {
        let mut repo = FakeRepo::new();

        repo.product_reader
            .expect_product_name_exists()
            .returning(|_, _| Ok(true));
        repo.product_writer.expect_create_product().never();

        let form = ProductForm::new("Monitor", "150000.00", "5");
        let result = create_product(&repo, form);

        match result {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors.get(FIELD_NAME), Some(&[NAME_TAKEN.to_string()][..]));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_product_skips_uniqueness_probe_for_blank_name() {
        let mut repo = FakeRepo::new();

        repo.product_reader.expect_product_name_exists().never();
        repo.product_writer.expect_create_product().never();

        let form = ProductForm {
            name: Some("  ".to_string()),
            amount: Some("-1".into()),
            qty: None,
        };
        let result = create_product(&repo, form);

        match result {
            Err(ServiceError::Validation(errors)) => {
                assert!(errors.contains(FIELD_NAME));
                assert_eq!(
                    errors.get(FIELD_AMOUNT),
                    Some(&[AMOUNT_NEGATIVE.to_string()][..])
                );
                assert_eq!(errors.get(FIELD_QTY), Some(&[QTY_REQUIRED.to_string()][..]));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_product_surfaces_constraint_violation_as_conflict() {
        let mut repo = FakeRepo::new();

        repo.product_reader
            .expect_product_name_exists()
            .returning(|_, _| Ok(false));
        repo.product_writer.expect_create_product().returning(|_| {
            Err(RepositoryError::ConstraintViolation(
                "UNIQUE constraint failed: products.name".to_string(),
            ))
        });

        let form = ProductForm::new("Monitor", "1", "1");
        let result = create_product(&repo, form);

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn update_product_excludes_own_id_from_uniqueness() {
        let mut repo = FakeRepo::new();

        repo.product_reader
            .expect_product_name_exists()
            .times(1)
            .withf(|name, exclude_id| name == "Monitor" && *exclude_id == Some(3))
            .returning(|_, _| Ok(false));

        repo.product_writer
            .expect_update_product()
            .times(1)
            .withf(|product_id, updates| {
                assert_eq!(*product_id, 3);
                assert_eq!(updates.name, "Monitor");
                assert_eq!(updates.amount_cents, 99_900);
                assert_eq!(updates.qty, 0);
                true
            })
            .returning(|product_id, updates| {
                Ok(sample_product(
                    product_id,
                    &updates.name,
                    updates.amount_cents,
                    updates.qty,
                ))
            });

        let form = ProductForm::new("Monitor", "999", "0");
        let product = update_product(&repo, 3, form).expect("expected success");

        assert_eq!(product.id, 3);
        assert_eq!(product.qty, 0);
    }

    #[test]
    fn update_product_reports_missing_product() {
        let mut repo = FakeRepo::new();

        repo.product_reader
            .expect_product_name_exists()
            .returning(|_, _| Ok(false));
        repo.product_writer
            .expect_update_product()
            .returning(|_, _| Err(RepositoryError::NotFound));

        let form = ProductForm::new("Monitor", "1", "1");
        let result = update_product(&repo, 404, form);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn update_product_with_invalid_form_does_not_write() {
        let mut repo = FakeRepo::new();

        repo.product_reader
            .expect_product_name_exists()
            .returning(|_, _| Ok(false));
        repo.product_writer.expect_update_product().never();

        let form = ProductForm::new("Monitor", "1", "-1");
        let result = update_product(&repo, 3, form);

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn delete_product_maps_not_found() {
        let mut repo = MockProductWriter::new();
        repo.expect_delete_product()
            .times(1)
            .withf(|id| *id == 5)
            .returning(|_| Err(RepositoryError::NotFound));

        let result = delete_product(&repo, 5);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn delete_product_succeeds() {
        let mut repo = MockProductWriter::new();
        repo.expect_delete_product().times(1).returning(|_| Ok(()));

        assert!(delete_product(&repo, 5).is_ok());
    }
}
