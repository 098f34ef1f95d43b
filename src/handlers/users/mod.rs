pub mod account;
pub mod session;

pub use account::get as user_get;
pub use account::list as user_list;
pub use account::signup;
pub use session::signin;
