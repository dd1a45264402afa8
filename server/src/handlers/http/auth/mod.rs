pub mod login;
pub mod logout;
pub mod sessions;
pub mod status;

pub use login::handle_login;
pub use logout::{handle_logout, handle_session_logout};
pub use sessions::handle_session_info;
pub use status::handle_status;
