/// Tower middleware module
///
/// Layers wrapped around the site service before it is handed to hyper:
/// - Session gate for the admin UI, blog writes and uploads
pub mod tower_auth_gate;

pub use tower_auth_gate::{AuthGateLayer, AuthGateService, Protection, classify};
