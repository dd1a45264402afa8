pub mod auth;
pub mod blog;
pub mod clients;
pub mod routes;
pub mod site_content;
pub mod upload;
pub mod utils;

pub use routes::{Router, build_site_router};
