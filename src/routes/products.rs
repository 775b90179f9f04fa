use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::Serialize;
use tera::Tera;

use crate::forms::errors::FieldErrors;
use crate::forms::products::{FIELD_NAME, NAME_TAKEN, ProductForm};
use crate::repository::DieselRepository;
use crate::routes::{base_context, redirect, render_template};
use crate::services::{ServiceError, products};

/// Old input echoed back into the product form.
#[derive(Debug, Serialize)]
struct FormValues {
    name: String,
    amount: String,
    qty: String,
}

impl From<&ProductForm> for FormValues {
    fn from(form: &ProductForm) -> Self {
        Self {
            name: form.name.clone().unwrap_or_default(),
            amount: form
                .amount
                .as_ref()
                .map(|value| value.as_text().into_owned())
                .unwrap_or_default(),
            qty: form
                .qty
                .as_ref()
                .map(|value| value.as_text().into_owned())
                .unwrap_or_default(),
        }
    }
}

fn render_product_form(
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
    form: &ProductForm,
    errors: &FieldErrors,
    product_id: Option<i32>,
) -> HttpResponse {
    let mut context = base_context(flash_messages, "products");
    let action = match product_id {
        Some(id) => format!("/products/{id}/edit"),
        None => "/products".to_string(),
    };
    context.insert("form", &FormValues::from(form));
    context.insert("errors", errors);
    context.insert("product_id", &product_id);
    context.insert("action", &action);
    render_template(tera, "products/form.html", &context)
}

/// Field errors to show when the store rejected a name that passed validation.
fn conflict_errors() -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add(FIELD_NAME, NAME_TAKEN);
    errors
}

#[get("/products")]
pub async fn show_products(
    params: web::Query<products::ProductsQuery>,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match products::load_products_page(repo.get_ref(), params.into_inner()) {
        Ok(data) => {
            let mut context = base_context(&flash_messages, "products");
            let page_numbers: Vec<usize> = (1..=data.products.total_pages).collect();
            context.insert("products", &data.products);
            context.insert("page_numbers", &page_numbers);
            context.insert("has_previous", &data.products.has_previous());
            context.insert("has_next", &data.products.has_next());
            context.insert("search", data.search.as_deref().unwrap_or(""));
            render_template(&tera, "products/index.html", &context)
        }
        Err(err) => {
            log::error!("Failed to list products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/products/create")]
pub async fn new_product(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    render_product_form(
        &tera,
        &flash_messages,
        &ProductForm::default(),
        &FieldErrors::new(),
        None,
    )
}

#[post("/products")]
pub async fn add_product(
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ProductForm>,
) -> impl Responder {
    match products::create_product(repo.get_ref(), form.clone()) {
        Ok(product) => {
            FlashMessage::success(format!("Product «{}» added.", product.name)).send();
            redirect("/products")
        }
        Err(ServiceError::Validation(errors)) => {
            render_product_form(&tera, &flash_messages, &form, &errors, None)
        }
        Err(ServiceError::Conflict(message)) => {
            log::warn!("Product name conflict on create: {message}");
            render_product_form(&tera, &flash_messages, &form, &conflict_errors(), None)
        }
        Err(err) => {
            log::error!("Failed to create product: {err}");
            FlashMessage::error("Failed to add the product.").send();
            redirect("/products")
        }
    }
}

#[get("/products/{product_id}/edit")]
pub async fn edit_product(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let product_id = path.into_inner();

    match products::find_product(repo.get_ref(), product_id) {
        Ok(product) => render_product_form(
            &tera,
            &flash_messages,
            &ProductForm::from_product(&product),
            &FieldErrors::new(),
            Some(product.id),
        ),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found.").send();
            redirect("/products")
        }
        Err(err) => {
            log::error!("Failed to load product {product_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/products/{product_id}/edit")]
pub async fn update_product(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ProductForm>,
) -> impl Responder {
    let product_id = path.into_inner();

    match products::update_product(repo.get_ref(), product_id, form.clone()) {
        Ok(product) => {
            FlashMessage::success(format!("Product «{}» updated.", product.name)).send();
            redirect("/products")
        }
        Err(ServiceError::Validation(errors)) => {
            render_product_form(&tera, &flash_messages, &form, &errors, Some(product_id))
        }
        Err(ServiceError::Conflict(message)) => {
            log::warn!("Product name conflict on update of {product_id}: {message}");
            render_product_form(
                &tera,
                &flash_messages,
                &form,
                &conflict_errors(),
                Some(product_id),
            )
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found.").send();
            redirect("/products")
        }
        Err(err) => {
            log::error!("Failed to update product {product_id}: {err}");
            FlashMessage::error("Failed to update the product.").send();
            redirect("/products")
        }
    }
}

#[post("/products/{product_id}/delete")]
pub async fn delete_product(
    path: web::Path<i32>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let product_id = path.into_inner();

    match products::delete_product(repo.get_ref(), product_id) {
        Ok(()) => {
            FlashMessage::success("Product deleted.").send();
            redirect("/products")
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found or already deleted.").send();
            redirect("/products")
        }
        Err(err) => {
            log::error!("Failed to delete product {product_id}: {err}");
            FlashMessage::error("Failed to delete the product.").send();
            redirect("/products")
        }
    }
}
