pub mod blog;
pub mod clients;
pub mod create;
pub mod seed;
pub mod site_content;
pub mod utils;

pub use create::{connect, create_tables};
