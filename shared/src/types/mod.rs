pub mod blog;
pub mod client;
pub mod json_error;
pub mod login;
pub mod server_config;
pub mod session;
pub mod site_content;
pub mod upload;

pub use self::blog::{BlogPost, BlogPostInput, NewBlogPost, SeedPost};
pub use self::client::{Client, ClientFields, ClientInput};
pub use self::json_error::{ErrorResponse, SuccessResponse};
pub use self::login::{LoginData, LoginError, LoginResponse};
pub use self::session::{
    AuditEntry, Principal, SessionInfo, SessionStatus, TokenHeader, TokenPayload,
};
pub use self::site_content::HomePageContent;
pub use self::upload::UploadResponse;
