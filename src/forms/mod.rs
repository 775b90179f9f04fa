pub mod errors;
pub mod products;
