use actix_files::Files;
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use tera::Tera;

use product_inventory::config::ServerConfig;
use product_inventory::db::{establish_connection_pool, run_migrations};
use product_inventory::repository::DieselRepository;
use product_inventory::routes::main::show_index;
use product_inventory::routes::products::{
    add_product, delete_product, edit_product, new_product, show_products, update_product,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let secret_key = match &config.secret {
        Some(secret) => Key::from(secret.as_bytes()),
        None => {
            log::warn!("SECRET_KEY not set, flash messages will not survive a restart");
            Key::generate()
        }
    };

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = run_migrations(&pool) {
        log::error!("{e}");
        std::process::exit(1);
    }
    let repo = DieselRepository::new(pool);

    let message_store = CookieMessageStore::builder(secret_key).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = match Tera::new(&config.templates) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Parsing error(s): {e}");
            std::process::exit(1);
        }
    };

    log::info!("Listening on {}:{}", config.address, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(show_index)
            .service(show_products)
            .service(new_product)
            .service(add_product)
            .service(edit_product)
            .service(update_product)
            .service(delete_product)
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
    })
    .bind((config.address.as_str(), config.port))?
    .run()
    .await
}
