pub mod auth;
pub mod response;

pub use auth::{check_token, require_admin, AuthUser};
pub use response::{ApiResponse, ApiResult};
