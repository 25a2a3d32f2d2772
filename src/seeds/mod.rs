pub mod admin_seed;
pub mod catalog_seed;

pub use admin_seed::{delete_admin, seed_admin};
pub use catalog_seed::seed_catalog;
