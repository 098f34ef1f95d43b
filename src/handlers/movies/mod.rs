pub mod credits;
pub mod movie;

// Re-export handler functions for use in routing
pub use movie::create as movie_create;
pub use movie::delete as movie_delete;
pub use movie::get as movie_get;
pub use movie::list as movie_list;
pub use movie::update as movie_update;

pub use credits::delete as credits_delete;
pub use credits::get as credits_get;
pub use credits::patch as credits_patch;
pub use credits::post as credits_post;
